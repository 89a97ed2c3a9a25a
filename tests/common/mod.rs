//! Shared test scaffolding

pub mod mock_interface;

pub use mock_interface::{MockError, MockInterface, Operation};
pub use test_utils::{
    create_configured_driver, create_configured_driver_with, create_driver_with,
    create_mock_driver, mock_rails, Fixture, MockDelay, MockDriver, MockEnableLine, MockRails,
    MockRegulator, PowerEvent, PowerLog, RecordingSink,
};
