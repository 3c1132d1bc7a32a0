pub mod mock_kernel;
pub mod primitives;
pub mod tessellation;
pub mod traits;
mod truck_fillet;
pub mod truck_introspect;
pub mod truck_kernel;
pub mod types;

pub use mock_kernel::{FilletAttempt, MockKernel};
pub use traits::*;
pub use truck_kernel::TruckKernel;
pub use types::*;
