//! Entity module - Contains all SeaORM entity definitions for the store.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod feature_access;
pub mod identity;
pub mod organization;
pub mod submission;
pub mod user;
pub mod user_entity;
pub mod waitlist;

// Re-export specific types to avoid conflicts
pub use feature_access::{
    Column as FeatureAccessColumn, Entity as FeatureAccess, Model as FeatureAccessModel,
};
pub use identity::{
    AuthProvider, Column as IdentityColumn, Entity as Identity, Model as IdentityModel,
};
pub use organization::{
    Column as OrganizationColumn, Entity as Organization, EntityKind, Model as OrganizationModel,
    TeamMember, TeamMembers,
};
pub use submission::{
    Column as SubmissionColumn, Entity as Submission, Model as SubmissionModel, SubmissionStatus,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use user_entity::{
    Column as UserEntityColumn, Entity as UserEntity, LinkRole, Model as UserEntityModel,
};
pub use waitlist::{Column as WaitlistColumn, Entity as Waitlist, Model as WaitlistModel};
