pub mod curate;
pub mod error;
pub mod evidence;
pub mod io;
pub mod layout;
pub mod pipeline;
pub mod select;
pub mod stage;
pub mod tool;
