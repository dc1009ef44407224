//! Whitelisted tag=value decoder for a small FIX subset.
//!
//! A message is one line of `tag=value` pairs split on `|` or the real SOH
//! byte. Only whitelisted tags are interpreted; everything else is kept
//! verbatim in arrival order and otherwise ignored. Decoding is a pure
//! function of the line and never touches engine state.

use crate::models::{ExecStatus, IngressMessage};
use log::debug;
use oms_api::{OrderId, OrderRequest, OrderType, Side, Symbol};
use std::collections::HashMap;
use thiserror::Error;

pub mod tags {
    pub const BEGIN_STRING: u32 = 8;
    pub const BODY_LENGTH: u32 = 9;
    pub const CHECKSUM: u32 = 10;
    pub const CL_ORD_ID: u32 = 11;
    pub const MSG_SEQ_NUM: u32 = 34;
    pub const MSG_TYPE: u32 = 35;
    pub const ORDER_ID: u32 = 37;
    pub const ORDER_QTY: u32 = 38;
    pub const ORD_STATUS: u32 = 39;
    pub const ORD_TYPE: u32 = 40;
    pub const ORIG_CL_ORD_ID: u32 = 41;
    pub const PRICE: u32 = 44;
    pub const SENDER_COMP_ID: u32 = 49;
    pub const SENDING_TIME: u32 = 52;
    pub const SIDE: u32 = 54;
    pub const SYMBOL: u32 = 55;
    pub const TARGET_COMP_ID: u32 = 56;
    pub const TRANSACT_TIME: u32 = 60;
    pub const EXEC_TYPE: u32 = 150;
}

pub const WHITELIST: [u32; 19] = [
    tags::BEGIN_STRING,
    tags::BODY_LENGTH,
    tags::CHECKSUM,
    tags::CL_ORD_ID,
    tags::MSG_SEQ_NUM,
    tags::MSG_TYPE,
    tags::ORDER_ID,
    tags::ORDER_QTY,
    tags::ORD_STATUS,
    tags::ORD_TYPE,
    tags::ORIG_CL_ORD_ID,
    tags::PRICE,
    tags::SENDER_COMP_ID,
    tags::SENDING_TIME,
    tags::SIDE,
    tags::SYMBOL,
    tags::TARGET_COMP_ID,
    tags::TRANSACT_TIME,
    tags::EXEC_TYPE,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed segment: {0}")]
    Malformed(String),
    #[error("missing required tag {0}")]
    MissingField(u32),
    #[error("invalid value for tag {tag}: {value}")]
    InvalidField { tag: u32, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MsgType {
    NewOrderSingle,
    ExecutionReport,
    CancelRequest,
    CancelReplaceRequest,
    Other(String),
}

impl MsgType {
    fn from_wire(raw: &str) -> Self {
        match raw {
            "D" => MsgType::NewOrderSingle,
            "8" => MsgType::ExecutionReport,
            "F" => MsgType::CancelRequest,
            "G" => MsgType::CancelReplaceRequest,
            other => MsgType::Other(other.to_string()),
        }
    }
}

/// One decoded message: interpreted fields by tag, unknown tags preserved
/// in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct FixMessage {
    msg_type: MsgType,
    fields: HashMap<u32, String>,
    unknown: Vec<(u32, String)>,
}

impl FixMessage {
    pub fn msg_type(&self) -> &MsgType {
        &self.msg_type
    }

    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields.get(&tag).map(String::as_str)
    }

    pub fn unknown(&self) -> &[(u32, String)] {
        &self.unknown
    }

    fn require(&self, tag: u32) -> Result<&str, DecodeError> {
        self.get(tag).ok_or(DecodeError::MissingField(tag))
    }

    /// Turns the message into engine input. `Ok(None)` means the line was
    /// valid but of a type this engine does not act on.
    pub fn into_ingress(self) -> Result<Option<IngressMessage>, DecodeError> {
        match &self.msg_type {
            MsgType::NewOrderSingle => self.new_order().map(Some),
            MsgType::CancelRequest => self.cancel().map(Some),
            MsgType::CancelReplaceRequest => self.amend().map(Some),
            MsgType::ExecutionReport => self.execution().map(Some),
            MsgType::Other(raw) => {
                debug!("ignoring message type {raw}");
                Ok(None)
            }
        }
    }

    fn new_order(&self) -> Result<IngressMessage, DecodeError> {
        let symbol = self.require(tags::SYMBOL)?;
        let side = parse_side(self.require(tags::SIDE)?)?;
        let order_type = parse_order_type(self.require(tags::ORD_TYPE)?)?;
        let quantity = parse_quantity(self.require(tags::ORDER_QTY)?)?;
        // a price is required even for market orders: nothing can rest
        // without one
        let price = parse_price(self.require(tags::PRICE)?)?;

        let mut request = OrderRequest::new(symbol, side, quantity, price, order_type);
        if let Some(client_id) = self.get(tags::CL_ORD_ID) {
            request = request.with_client_id(client_id);
        }
        Ok(IngressMessage::NewOrder(request))
    }

    fn cancel(&self) -> Result<IngressMessage, DecodeError> {
        let (order_id, client_id) = self.reference(tags::ORIG_CL_ORD_ID)?;
        Ok(IngressMessage::Cancel {
            symbol: self.get(tags::SYMBOL).map(Symbol::new),
            order_id,
            client_id,
        })
    }

    fn amend(&self) -> Result<IngressMessage, DecodeError> {
        let (order_id, client_id) = self.reference(tags::ORIG_CL_ORD_ID)?;
        let quantity = parse_quantity(self.require(tags::ORDER_QTY)?)?;
        let price = match self.get(tags::PRICE) {
            Some(raw) => Some(parse_price(raw)?),
            None => None,
        };
        Ok(IngressMessage::Amend {
            symbol: self.get(tags::SYMBOL).map(Symbol::new),
            order_id,
            client_id,
            quantity,
            price,
        })
    }

    fn execution(&self) -> Result<IngressMessage, DecodeError> {
        let (order_id, client_id) = self.reference(tags::CL_ORD_ID)?;
        let status = parse_exec_status(self.require(tags::ORD_STATUS)?)?;
        Ok(IngressMessage::Execution {
            symbol: self.get(tags::SYMBOL).map(Symbol::new),
            order_id,
            client_id,
            status,
        })
    }

    /// A message aimed at an existing order must name tag 37 or a client
    /// reference (41 on requests, 11 on execution reports).
    fn reference(&self, client_tag: u32) -> Result<(Option<OrderId>, Option<String>), DecodeError> {
        let order_id = match self.get(tags::ORDER_ID) {
            Some(raw) => Some(parse_order_id(raw)?),
            None => None,
        };
        let client_id = self.get(client_tag).map(str::to_owned);
        if order_id.is_none() && client_id.is_none() {
            return Err(DecodeError::MissingField(tags::ORDER_ID));
        }
        Ok((order_id, client_id))
    }
}

pub fn decode(line: &str) -> Result<FixMessage, DecodeError> {
    let mut fields = HashMap::new();
    let mut unknown = Vec::new();
    for segment in line.split(['|', '\u{1}']) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (tag, value) = segment
            .split_once('=')
            .ok_or_else(|| DecodeError::Malformed(segment.to_string()))?;
        let tag: u32 = tag
            .trim()
            .parse()
            .map_err(|_| DecodeError::Malformed(segment.to_string()))?;
        if WHITELIST.contains(&tag) {
            fields.insert(tag, value.to_string());
        } else {
            unknown.push((tag, value.to_string()));
        }
    }
    let msg_type = fields
        .get(&tags::MSG_TYPE)
        .map(String::as_str)
        .ok_or(DecodeError::MissingField(tags::MSG_TYPE))?;
    Ok(FixMessage {
        msg_type: MsgType::from_wire(msg_type),
        fields,
        unknown,
    })
}

/// One line all the way to engine input.
pub fn decode_line(line: &str) -> Result<Option<IngressMessage>, DecodeError> {
    decode(line)?.into_ingress()
}

fn parse_side(raw: &str) -> Result<Side, DecodeError> {
    match raw {
        "1" => Ok(Side::Buy),
        "2" => Ok(Side::Sell),
        _ => Err(DecodeError::InvalidField {
            tag: tags::SIDE,
            value: raw.to_string(),
        }),
    }
}

fn parse_order_type(raw: &str) -> Result<OrderType, DecodeError> {
    match raw {
        "1" => Ok(OrderType::Market),
        "2" => Ok(OrderType::Limit),
        _ => Err(DecodeError::InvalidField {
            tag: tags::ORD_TYPE,
            value: raw.to_string(),
        }),
    }
}

fn parse_quantity(raw: &str) -> Result<u64, DecodeError> {
    match raw.parse::<u64>() {
        Ok(quantity) if quantity > 0 => Ok(quantity),
        _ => Err(DecodeError::InvalidField {
            tag: tags::ORDER_QTY,
            value: raw.to_string(),
        }),
    }
}

fn parse_price(raw: &str) -> Result<f64, DecodeError> {
    // "inf" parses as a valid f64 and would rest as an unbeatable best
    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() && price > 0.0 => Ok(price),
        _ => Err(DecodeError::InvalidField {
            tag: tags::PRICE,
            value: raw.to_string(),
        }),
    }
}

fn parse_order_id(raw: &str) -> Result<OrderId, DecodeError> {
    raw.parse::<u64>()
        .map(OrderId::new)
        .map_err(|_| DecodeError::InvalidField {
            tag: tags::ORDER_ID,
            value: raw.to_string(),
        })
}

fn parse_exec_status(raw: &str) -> Result<ExecStatus, DecodeError> {
    match raw {
        "2" => Ok(ExecStatus::Filled),
        "4" => Ok(ExecStatus::Canceled),
        _ => Err(DecodeError::InvalidField {
            tag: tags::ORD_STATUS,
            value: raw.to_string(),
        }),
    }
}
