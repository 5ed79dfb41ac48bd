pub mod deployment;
pub mod enterprise;
pub mod sequence_counter;
pub mod subscription;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::deployment::{self, Entity as Deployment};
    pub use super::enterprise::{self, Entity as Enterprise};
    pub use super::sequence_counter::{self, Entity as SequenceCounter};
    pub use super::subscription::{self, Entity as Subscription};
}
