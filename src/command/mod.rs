//! Command module - the device app's operation table.
//!
//! Provides:
//! - [`Command`] - every request and response the driver knows
//! - [`CommandDescriptor`] - opcode, name, length class and endpoint
//! - [`lookup`] / [`response_for`] / [`by_opcode`] - table queries
//!
//! # Example
//!
//! ```
//! use tkey_shamir::command::{lookup, response_for, Command};
//! use tkey_shamir::protocol::CmdLen;
//!
//! let put = lookup(Command::PutSecret);
//! assert_eq!(put.opcode, 0x03);
//! assert_eq!(put.cmd_len, CmdLen::Len128);
//!
//! let rsp = response_for(Command::PutSecret).unwrap();
//! assert_eq!(rsp.cmd_len, CmdLen::Len4);
//! ```

mod registry;

pub use registry::{
    by_opcode, lookup, response_for, Command, CommandDescriptor, ALL_COMMANDS,
};
