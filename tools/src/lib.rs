//! Inspection and decoding tools for Opal SSC captures.
//!
//! This crate turns raw security-protocol buffers into something a person can
//! read:
//!
//! - Level-0 discovery responses, with feature flags and the selected ComID
//! - ComPacket captures, with headers, the token stream and the decoded call
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - UIDs are annotated with their catalog names.
//! - **Lenient reports** - A payload that does not decode still yields its headers
//!   and the tokens read before the error.

use std::fmt::Write as _;

use codec::{decode_response_with, CodecLimits, Reply};
use serde::Serialize;
use serde_json::{json, Value as Json};
use token::{decode_stream, Marker, Token, Value};
use uid::Uid;
use wire::{
    parse_level0, unframe, DecodeError, LockingFeature, SscFeature, TperFeature,
};

/// Summary of a Level-0 discovery response.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub length: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub comid: Option<u16>,
    pub features: Vec<FeatureEntry>,
    pub tper: Option<TperFeature>,
    pub locking: Option<LockingFeature>,
    pub ssc: Option<SscFeature>,
}

/// One feature descriptor in a discovery report.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureEntry {
    pub code: u16,
    pub name: String,
    pub version: u8,
    pub data_len: usize,
}

/// Parses a discovery response into a report.
pub fn inspect_discovery(bytes: &[u8]) -> Result<DiscoveryReport, DecodeError> {
    let discovery = parse_level0(bytes)?;
    let features = discovery
        .features
        .iter()
        .map(|feature| FeatureEntry {
            code: feature.code.raw(),
            name: feature.code.to_string(),
            version: feature.version,
            data_len: feature.data.len(),
        })
        .collect();
    Ok(DiscoveryReport {
        length: discovery.header.length,
        major_version: discovery.header.major_version,
        minor_version: discovery.header.minor_version,
        comid: discovery.comid().map(wire::ComId::raw),
        features,
        tper: discovery.tper(),
        locking: discovery.locking(),
        ssc: discovery.ssc(),
    })
}

/// Renders a discovery report as indented text.
pub fn format_discovery_pretty(report: &DiscoveryReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "level 0: {} bytes, version {}.{}",
        report.length + 4,
        report.major_version,
        report.minor_version
    );
    match report.comid {
        Some(comid) => {
            let _ = writeln!(out, "comid: 0x{comid:04X}");
        }
        None => out.push_str("comid: none\n"),
    }
    out.push_str("features:\n");
    for feature in &report.features {
        let _ = writeln!(
            out,
            "  0x{:04X} {} v{} ({} bytes)",
            feature.code, feature.name, feature.version, feature.data_len
        );
    }
    if let Some(locking) = report.locking {
        let _ = writeln!(
            out,
            "locking: supported={} enabled={} locked={} mbr_enabled={} mbr_done={}",
            locking.supported, locking.enabled, locking.locked, locking.mbr_enabled, locking.mbr_done
        );
    }
    if let Some(ssc) = report.ssc {
        let _ = writeln!(
            out,
            "ssc: {} base_comid={} num_comids={}",
            ssc.code, ssc.base_comid, ssc.num_comids
        );
        if let (Some(admins), Some(users)) = (ssc.admin_authorities, ssc.user_authorities) {
            let _ = writeln!(out, "  authorities: {admins} admin, {users} user");
        }
        if let Some(msid) = ssc.initial_sid_is_msid {
            let _ = writeln!(out, "  initial SID PIN is MSID: {msid}");
        }
    }
    out
}

/// Decoded structure of one captured ComPacket.
#[derive(Debug, Clone, Serialize)]
pub struct PacketReport {
    pub comid: u16,
    pub hsn: u32,
    pub tsn: u32,
    pub com_packet_len: u32,
    pub packet_len: u32,
    pub sub_packet_len: u32,
    pub outstanding_data: u32,
    /// Token stream rendered one token per line, indented by nesting.
    pub tokens: Vec<String>,
    /// Structured call or response, when the payload decodes.
    pub decoded: Option<Json>,
    /// Why the payload did not decode.
    pub error: Option<String>,
}

/// Parses a captured ComPacket.
///
/// Framing errors fail the whole report; token errors are recorded in it.
pub fn inspect_packet(bytes: &[u8], limits: &CodecLimits) -> Result<PacketReport, DecodeError> {
    let frame = unframe(bytes)?;
    let ids = frame.ids();

    let mut tokens = Vec::new();
    let mut error = None;
    let mut depth = 0usize;
    for token in decode_stream(frame.payload) {
        match token {
            Ok(token) => {
                if matches!(
                    token.marker(),
                    Some(Marker::EndList | Marker::EndName)
                ) {
                    depth = depth.saturating_sub(1);
                }
                tokens.push(format!("{}{}", "  ".repeat(depth), describe_token(&token)));
                if matches!(
                    token.marker(),
                    Some(Marker::StartList | Marker::StartName)
                ) {
                    depth += 1;
                }
            }
            Err(err) => {
                error = Some(err.to_string());
                break;
            }
        }
    }

    let decoded = match decode_response_with(frame.payload, limits) {
        Ok(reply) => Some(reply_to_json(&reply)),
        Err(err) => {
            error.get_or_insert_with(|| err.to_string());
            None
        }
    };

    Ok(PacketReport {
        comid: frame.comid().raw(),
        hsn: ids.hsn,
        tsn: ids.tsn,
        com_packet_len: frame.com_packet.length,
        packet_len: frame.packet.length,
        sub_packet_len: frame.sub_packet.length,
        outstanding_data: frame.com_packet.outstanding_data,
        tokens,
        decoded,
        error,
    })
}

/// Renders a packet report as indented text.
pub fn format_packet_pretty(report: &PacketReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "comid: 0x{:04X} hsn: 0x{:X} tsn: 0x{:X}",
        report.comid, report.hsn, report.tsn
    );
    let _ = writeln!(
        out,
        "lengths: com_packet={} packet={} sub_packet={} outstanding={}",
        report.com_packet_len, report.packet_len, report.sub_packet_len, report.outstanding_data
    );
    out.push_str("tokens:\n");
    for line in &report.tokens {
        let _ = writeln!(out, "  {line}");
    }
    if let Some(decoded) = &report.decoded {
        let _ = writeln!(out, "decoded: {decoded}");
    }
    if let Some(error) = &report.error {
        let _ = writeln!(out, "error: {error}");
    }
    out
}

fn describe_token(token: &Token<'_>) -> String {
    match token {
        Token::Bytes(bytes) if bytes.len() == Uid::LEN => {
            let uid = Uid::from_slice(bytes);
            match uid.and_then(Uid::name) {
                Some(name) => format!("{token} {name}"),
                None => token.to_string(),
            }
        }
        _ => token.to_string(),
    }
}

fn reply_to_json(reply: &Reply) -> Json {
    match reply {
        Reply::EndOfSession => json!({ "end_of_session": true }),
        Reply::Method(response) => {
            let call = response.call.map(|(invoking, method)| {
                json!({
                    "invoking": uid_to_json(invoking),
                    "method": uid_to_json(method),
                })
            });
            json!({
                "call": call,
                "values": response.results.iter().map(value_to_json).collect::<Vec<_>>(),
                "status": response.status.raw(),
                "status_name": response.status.name(),
            })
        }
    }
}

fn uid_to_json(uid: Uid) -> Json {
    json!({
        "uid": format!("{uid}"),
        "name": uid.name(),
    })
}

/// Converts a token value to JSON, naming 8-byte strings found in the catalog.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Uint(v) => json!(v),
        Value::Bytes(bytes) => match Uid::from_slice(bytes).filter(|uid| uid.name().is_some()) {
            Some(uid) => uid_to_json(uid),
            None => match std::str::from_utf8(bytes) {
                Ok(text) if !text.is_empty() && text.chars().all(|c| c.is_ascii_graphic()) => {
                    json!({ "bytes": hex::encode(bytes), "text": text })
                }
                _ => json!({ "bytes": hex::encode(bytes) }),
            },
        },
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Named { name, value } => json!({
            "name": value_to_json(name),
            "value": value_to_json(value),
        }),
    }
}
