pub mod fund_movement;
pub mod settings;
pub mod template;
pub mod trade;

pub use fund_movement::*;
pub use settings::*;
pub use template::*;
pub use trade::*;
