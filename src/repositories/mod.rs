pub mod booking_repository;
pub mod damage_report_repository;
pub mod operational_hold_repository;
pub mod vehicle_repository;

pub use booking_repository::BookingRepository;
pub use damage_report_repository::DamageReportRepository;
pub use operational_hold_repository::OperationalHoldRepository;
pub use vehicle_repository::VehicleRepository;
