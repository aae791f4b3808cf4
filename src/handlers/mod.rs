// Two security tiers: public (no auth, token acquisition) and protected
// (JWT required, everything under /api/*).
pub mod protected;
pub mod public;
