// Discord commands module.
// Each feature gets its own command file.

pub mod economy;

pub mod general;

pub mod presence;
