mod lunar_year;
mod static_fragment;

pub use lunar_year::LunarYear;
pub use static_fragment::StaticFragment;
