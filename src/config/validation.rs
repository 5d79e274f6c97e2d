//! Configuration validation.
//!
//! Rejects settings that cannot be interpreted. Values that are merely out of range
//! (brightness, fade duration, poll interval) are clamped during loading instead.

use anyhow::{Context, Result};
use std::collections::HashMap;

use super::{Config, ConfigFile};
use crate::common::constants::*;
use crate::lighting::Channel;
use crate::lighting::blackout::parse_time_of_day;

pub(crate) fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(serial) = &config.serial {
        if let Some(port) = &serial.port
            && port.trim().is_empty()
        {
            anyhow::bail!("serial.port must not be empty");
        }

        if let Some(baud_rate) = serial.baud_rate
            && !(MINIMUM_BAUD_RATE..=MAXIMUM_BAUD_RATE).contains(&baud_rate)
        {
            anyhow::bail!(
                "serial.baud_rate ({}) must be between {} and {}",
                baud_rate,
                MINIMUM_BAUD_RATE,
                MAXIMUM_BAUD_RATE
            );
        }
    }

    if let Some(player) = &config.player
        && player.trim().is_empty()
    {
        anyhow::bail!("player must not be empty (use \"auto\" to follow any player)");
    }

    if let Some(blackout) = &config.blackout {
        match (&blackout.start, &blackout.end) {
            (Some(start), Some(end)) => {
                parse_time_of_day(start).context("Invalid blackout.start")?;
                parse_time_of_day(end).context("Invalid blackout.end")?;
            }
            (None, None) => {}
            _ => anyhow::bail!("blackout needs both start and end times (HH:MM:SS)"),
        }
    }

    Ok(())
}

/// Two enabled channels must not share a controller address.
pub fn validate_channel_addresses(config: &Config) -> Result<()> {
    let mut seen: HashMap<u16, Channel> = HashMap::new();

    for channel in Channel::ALL {
        let settings = config.channel(channel);
        if !settings.enabled {
            continue;
        }
        if let Some(other) = seen.insert(settings.address, channel) {
            anyhow::bail!(
                "channels.{} and channels.{} both use address {}",
                other.key(),
                channel.key(),
                settings.address
            );
        }
    }

    Ok(())
}
