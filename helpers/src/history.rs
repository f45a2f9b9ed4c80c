use serde::{Deserialize, Serialize};

/// Latest price of the fetched history, as broadcast to every participant.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct History {
    pub price: i64,
}

impl History {
    pub fn new(price: i64) -> Self {
        Self { price }
    }

    pub fn is_even(&self) -> bool {
        self.price % 2 == 0
    }
}
