pub mod booking_controller;
pub mod damage_report_controller;
pub mod operational_hold_controller;
pub mod vehicle_controller;
pub mod vehicle_detail_controller;
