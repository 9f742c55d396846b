pub mod admin_helpers;
pub mod authorization;
pub mod form_helpers;
pub mod pagination;
pub mod public_helpers;
pub mod render;
pub mod urls;
pub mod visibility;
