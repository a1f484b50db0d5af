//! Clamped resource pools (health, mana, stamina).

use serde::{Deserialize, Serialize};

/// A `[0, max]` pool. Every mutation clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    current: u32,
    max: u32,
}

impl Pool {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.current as f32 / self.max as f32
        }
    }

    /// Removes up to `amount`, returns how much was actually removed.
    pub fn drain(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.current);
        self.current -= taken;
        taken
    }

    /// Adds up to the headroom, returns how much was actually restored.
    pub fn restore(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.max - self.current);
        self.current += added;
        added
    }

    pub fn can_afford(&self, amount: u32) -> bool {
        self.current >= amount
    }

    /// Spend exactly `amount` or nothing.
    pub fn spend(&mut self, amount: u32) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        self.current -= amount;
        true
    }

    pub fn set(&mut self, value: u32) {
        self.current = value.min(self.max);
    }
}

/// Mana and stamina cost of an action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    #[serde(default)]
    pub mana: u32,
    #[serde(default)]
    pub stamina: u32,
}

impl Cost {
    pub fn mana(amount: u32) -> Self {
        Self {
            mana: amount,
            stamina: 0,
        }
    }

    pub fn stamina(amount: u32) -> Self {
        Self {
            mana: 0,
            stamina: amount,
        }
    }

    pub fn free() -> Self {
        Self::default()
    }

    pub fn is_free(&self) -> bool {
        self.mana == 0 && self.stamina == 0
    }
}
