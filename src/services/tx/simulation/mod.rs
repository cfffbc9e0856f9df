pub mod simulation_service;
