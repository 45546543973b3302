pub mod advert_query;
pub mod advert_repository;
pub mod advert_service;
pub mod advert_validator;
pub mod linkage;
pub mod short_link_service;
pub mod state_filter;
