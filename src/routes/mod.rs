pub mod booking_routes;
pub mod damage_report_routes;
pub mod operational_hold_routes;
pub mod vehicle_routes;
