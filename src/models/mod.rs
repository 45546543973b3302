pub mod advert;
pub mod advertiser;
pub mod location;
pub mod order;
pub mod subuser;
