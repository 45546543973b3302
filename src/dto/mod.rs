pub mod advert_dto;
