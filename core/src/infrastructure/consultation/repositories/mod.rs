pub mod consultation_repository;
