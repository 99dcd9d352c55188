// handlers/mod.rs - three security tiers
//
// Public (no auth) -> Protected (JWT + stored profile) -> Elevated (SUPER_ADMIN profile)
pub mod elevated;
pub mod protected;
pub mod public;
