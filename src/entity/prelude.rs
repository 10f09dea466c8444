//! 预导入模块，方便使用

pub use super::applications::{
    ActiveModel as ApplicationActiveModel, Entity as Applications, Model as ApplicationModel,
};
pub use super::graders::{ActiveModel as GraderActiveModel, Entity as Graders, Model as GraderModel};
pub use super::reviews::{ActiveModel as ReviewActiveModel, Entity as Reviews, Model as ReviewModel};
