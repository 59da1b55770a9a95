/// Module for the sensor forecasting network.
pub mod forecast_network;
