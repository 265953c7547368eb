pub mod consts;
pub mod error;
pub mod facts;
pub mod hardware;
pub mod normalize;
pub mod report;
pub mod rules;
