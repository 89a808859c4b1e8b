pub mod building_generator;
