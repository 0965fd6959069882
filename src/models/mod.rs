pub mod business_indicator;
pub mod calculation;
pub mod loss_event;
pub mod parameter_set;
pub mod supervisor_override;

pub use business_indicator::*;
pub use calculation::*;
pub use loss_event::*;
pub use parameter_set::*;
pub use supervisor_override::*;
