pub mod cooloff_sweep;
pub mod catalog_backfill;
