pub mod api_response;
pub mod booking_dto;
pub mod damage_report_dto;
pub mod operational_hold_dto;
pub mod vehicle_detail_dto;
pub mod vehicle_dto;

pub use api_response::ApiResponse;
