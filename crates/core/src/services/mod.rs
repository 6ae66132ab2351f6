pub mod enrichment_service;
