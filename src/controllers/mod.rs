pub mod home_controller;
pub mod api_controller;
