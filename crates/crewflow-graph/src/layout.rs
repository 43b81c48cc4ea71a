//! Horizontal layout of projected nodes.
//!
//! Agent nodes sit in bands of 20% of the container width: position `p`
//! occupies `[(p - 1) * 20%, p * 20%)`. The sim node sits centred above them.

pub const AGENT_BAND_PERCENT: u16 = 20;

/// A horizontal span in container cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub x: u16,
    pub width: u16,
}

impl Band {
    pub fn center(&self) -> u16 {
        self.x + self.width / 2
    }
}

fn percent_of(width: u16, percent: u32) -> u16 {
    ((width as u32 * percent) / 100) as u16
}

/// Band for an agent node. `None` for the sim position and for positions
/// past the right edge.
pub fn agent_band(position: u32, container_width: u16) -> Option<Band> {
    if position == 0 {
        return None;
    }
    let start = (position - 1).checked_mul(AGENT_BAND_PERCENT as u32)?;
    if start >= 100 {
        return None;
    }
    let x = percent_of(container_width, start);
    let end = percent_of(container_width, start + AGENT_BAND_PERCENT as u32);
    Some(Band {
        x,
        width: end.saturating_sub(x),
    })
}

/// Band for the sim node: one band wide, centred.
pub fn sim_band(container_width: u16) -> Band {
    let width = percent_of(container_width, AGENT_BAND_PERCENT as u32);
    Band {
        x: (container_width - width) / 2,
        width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_bands_tile_container() {
        let bands: Vec<Band> = (1..=5).filter_map(|p| agent_band(p, 100)).collect();
        assert_eq!(bands.len(), 5);
        assert_eq!(bands[0], Band { x: 0, width: 20 });
        assert_eq!(bands[4], Band { x: 80, width: 20 });
        for pair in bands.windows(2) {
            assert_eq!(pair[0].x + pair[0].width, pair[1].x);
        }
    }

    #[test]
    fn test_out_of_range_positions() {
        assert_eq!(agent_band(0, 100), None);
        assert_eq!(agent_band(6, 100), None);
    }

    #[test]
    fn test_sim_band_centred() {
        let band = sim_band(120);
        assert_eq!(band.width, 24);
        assert_eq!(band.center(), 60);
    }

    #[test]
    fn test_narrow_container() {
        let band = agent_band(3, 7).unwrap();
        assert!(band.x + band.width <= 7);
    }
}
