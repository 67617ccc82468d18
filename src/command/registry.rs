//! Static command registry.
//!
//! The table is a `match` over [`Command`], so adding a variant without a
//! descriptor fails to compile instead of failing at runtime.

use crate::protocol::{CmdLen, Endpoint};

/// Every operation understood by the Shamir device app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GetNameVersion,
    RspGetNameVersion,
    PutSecret,
    RspPutSecret,
    GetShare,
    RspGetShare,
    PutShare,
    RspPutShare,
    GetSecret,
    RspGetSecret,
    GetPubKey,
    RspGetPubKey,
    PutPubKey,
    RspPutPubKey,
}

/// All commands, requests and responses interleaved in opcode order.
pub const ALL_COMMANDS: [Command; 14] = [
    Command::GetNameVersion,
    Command::RspGetNameVersion,
    Command::PutSecret,
    Command::RspPutSecret,
    Command::GetShare,
    Command::RspGetShare,
    Command::PutShare,
    Command::RspPutShare,
    Command::GetSecret,
    Command::RspGetSecret,
    Command::GetPubKey,
    Command::RspGetPubKey,
    Command::PutPubKey,
    Command::RspPutPubKey,
];

/// Immutable description of one wire command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Which command this describes.
    pub command: Command,
    /// Opcode byte, first byte of the frame body.
    pub opcode: u8,
    /// Human-readable name used in logs and errors.
    pub name: &'static str,
    /// Fixed body length class.
    pub cmd_len: CmdLen,
    /// Destination endpoint.
    pub endpoint: Endpoint,
    /// Response carries a status byte as its first payload byte.
    pub has_status: bool,
}

impl CommandDescriptor {
    const fn app(
        command: Command,
        opcode: u8,
        name: &'static str,
        cmd_len: CmdLen,
        has_status: bool,
    ) -> Self {
        Self {
            command,
            opcode,
            name,
            cmd_len,
            endpoint: Endpoint::App,
            has_status,
        }
    }

    /// Payload capacity: body length minus the opcode byte.
    #[inline]
    pub const fn payload_capacity(&self) -> usize {
        self.cmd_len.byte_len() - 1
    }

    /// True for device-to-host commands.
    #[inline]
    pub const fn is_response(&self) -> bool {
        self.opcode % 2 == 0
    }
}

impl std::fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

const GET_NAME_VERSION: CommandDescriptor = CommandDescriptor::app(
    Command::GetNameVersion,
    0x01,
    "cmdGetNameVersion",
    CmdLen::Len1,
    false,
);
const RSP_GET_NAME_VERSION: CommandDescriptor = CommandDescriptor::app(
    Command::RspGetNameVersion,
    0x02,
    "rspGetNameVersion",
    CmdLen::Len32,
    false,
);
const PUT_SECRET: CommandDescriptor = CommandDescriptor::app(
    Command::PutSecret,
    0x03,
    "cmdPutSecret",
    CmdLen::Len128,
    false,
);
const RSP_PUT_SECRET: CommandDescriptor = CommandDescriptor::app(
    Command::RspPutSecret,
    0x04,
    "rspPutSecret",
    CmdLen::Len4,
    true,
);
const GET_SHARE: CommandDescriptor =
    CommandDescriptor::app(Command::GetShare, 0x05, "cmdGetShare", CmdLen::Len4, false);
const RSP_GET_SHARE: CommandDescriptor = CommandDescriptor::app(
    Command::RspGetShare,
    0x06,
    "rspGetShare",
    CmdLen::Len128,
    true,
);
const PUT_SHARE: CommandDescriptor = CommandDescriptor::app(
    Command::PutShare,
    0x07,
    "cmdPutShare",
    CmdLen::Len128,
    false,
);
const RSP_PUT_SHARE: CommandDescriptor = CommandDescriptor::app(
    Command::RspPutShare,
    0x08,
    "rspPutShare",
    CmdLen::Len4,
    true,
);
const GET_SECRET: CommandDescriptor = CommandDescriptor::app(
    Command::GetSecret,
    0x09,
    "cmdGetSecret",
    CmdLen::Len4,
    false,
);
const RSP_GET_SECRET: CommandDescriptor = CommandDescriptor::app(
    Command::RspGetSecret,
    0x0a,
    "rspGetSecret",
    CmdLen::Len128,
    true,
);
const GET_PUB_KEY: CommandDescriptor = CommandDescriptor::app(
    Command::GetPubKey,
    0x0b,
    "cmdGetPubKey",
    CmdLen::Len1,
    false,
);
const RSP_GET_PUB_KEY: CommandDescriptor = CommandDescriptor::app(
    Command::RspGetPubKey,
    0x0c,
    "rspGetPubKey",
    CmdLen::Len128,
    true,
);
const PUT_PUB_KEY: CommandDescriptor = CommandDescriptor::app(
    Command::PutPubKey,
    0x0d,
    "cmdPutPubKey",
    CmdLen::Len128,
    false,
);
// Class 1 leaves room for the opcode only, so there is no status byte.
const RSP_PUT_PUB_KEY: CommandDescriptor = CommandDescriptor::app(
    Command::RspPutPubKey,
    0x0e,
    "rspPutPubKey",
    CmdLen::Len1,
    false,
);

/// Get the descriptor for a command.
pub fn lookup(command: Command) -> &'static CommandDescriptor {
    match command {
        Command::GetNameVersion => &GET_NAME_VERSION,
        Command::RspGetNameVersion => &RSP_GET_NAME_VERSION,
        Command::PutSecret => &PUT_SECRET,
        Command::RspPutSecret => &RSP_PUT_SECRET,
        Command::GetShare => &GET_SHARE,
        Command::RspGetShare => &RSP_GET_SHARE,
        Command::PutShare => &PUT_SHARE,
        Command::RspPutShare => &RSP_PUT_SHARE,
        Command::GetSecret => &GET_SECRET,
        Command::RspGetSecret => &RSP_GET_SECRET,
        Command::GetPubKey => &GET_PUB_KEY,
        Command::RspGetPubKey => &RSP_GET_PUB_KEY,
        Command::PutPubKey => &PUT_PUB_KEY,
        Command::RspPutPubKey => &RSP_PUT_PUB_KEY,
    }
}

/// Get the response descriptor paired with a request.
///
/// Returns `None` when `request` is itself a response.
pub fn response_for(request: Command) -> Option<&'static CommandDescriptor> {
    let response = match request {
        Command::GetNameVersion => Command::RspGetNameVersion,
        Command::PutSecret => Command::RspPutSecret,
        Command::GetShare => Command::RspGetShare,
        Command::PutShare => Command::RspPutShare,
        Command::GetSecret => Command::RspGetSecret,
        Command::GetPubKey => Command::RspGetPubKey,
        Command::PutPubKey => Command::RspPutPubKey,
        _ => return None,
    };
    Some(lookup(response))
}

/// Reverse lookup by opcode.
pub fn by_opcode(opcode: u8) -> Option<&'static CommandDescriptor> {
    ALL_COMMANDS
        .iter()
        .map(|&c| lookup(c))
        .find(|d| d.opcode == opcode)
}
