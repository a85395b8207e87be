pub mod change_entry;
pub mod declaration;
pub mod params;
