use serde_json::Value;

use crate::attribute_value::decode_image;
use crate::contract::{EventName, Item, StreamRecord, ValidationError};

/// A classified library change with its decoded image.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryChange {
    /// INSERT or MODIFY, carrying the new image.
    Upsert { event: EventName, item: Item },
    /// REMOVE, carrying the old image.
    Removal { item: Item },
}

impl LibraryChange {
    pub fn event(&self) -> EventName {
        match self {
            Self::Upsert { event, .. } => *event,
            Self::Removal { .. } => EventName::Remove,
        }
    }

    pub fn item(&self) -> &Item {
        match self {
            Self::Upsert { item, .. } | Self::Removal { item } => item,
        }
    }

    pub fn into_item(self) -> Item {
        match self {
            Self::Upsert { item, .. } | Self::Removal { item } => item,
        }
    }
}

pub fn classify(record: &StreamRecord) -> Result<LibraryChange, ValidationError> {
    let event = EventName::parse(&record.event_name)?;
    let images = record.dynamodb.as_ref();

    match event {
        EventName::Insert | EventName::Modify => {
            let image = images
                .and_then(|images| images.new_image.as_ref())
                .ok_or_else(|| ValidationError::new(format!("{event} record has no NewImage")))?;
            Ok(LibraryChange::Upsert {
                event,
                item: decode_image(image)?,
            })
        }
        EventName::Remove => {
            let image = images
                .and_then(|images| images.old_image.as_ref())
                .ok_or_else(|| ValidationError::new("REMOVE record has no OldImage"))?;
            Ok(LibraryChange::Removal {
                item: decode_image(image)?,
            })
        }
    }
}

/// Parses a raw stream record and classifies it.
pub fn classify_value(record: &Value) -> Result<LibraryChange, ValidationError> {
    let record: StreamRecord = serde_json::from_value(record.clone())
        .map_err(|error| ValidationError::new(format!("Malformed stream record: {error}")))?;
    classify(&record)
}
