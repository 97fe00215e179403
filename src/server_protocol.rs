use serde_json::Value;

use crate::types::{ChatScope, Direction};

#[derive(Debug)]
pub enum ParsedClientMessage {
    Join { name: String },
    Move { dir: Direction },
    Collect { star_id: String },
    Chat { message: String, scope: ChatScope },
    Start,
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "join" => {
            let name = match object.get("name") {
                None | Some(Value::Null) => String::new(),
                Some(value) => value.as_str()?.to_string(),
            };
            Some(ParsedClientMessage::Join { name })
        }
        "move" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Move { dir })
        }
        "collect" => {
            let star_id = object.get("starId")?.as_str()?.to_string();
            if star_id.is_empty() {
                return None;
            }
            Some(ParsedClientMessage::Collect { star_id })
        }
        "chat" => {
            let message = object.get("message")?.as_str()?.to_string();
            let scope = match object.get("scope") {
                None => ChatScope::Global,
                Some(value) => ChatScope::parse(value.as_str()?)?,
            };
            Some(ParsedClientMessage::Chat { message, scope })
        }
        "start" => Some(ParsedClientMessage::Start),
        _ => None,
    }
}
