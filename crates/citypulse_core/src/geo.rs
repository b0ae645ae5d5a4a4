use crate::schema::{Coordinates, Issue};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Used when no location is available (central Mumbai).
pub const FALLBACK_LOCATION: Coordinates = Coordinates {
    lat: 19.0760,
    lng: 72.8777,
};

/// Great-circle distance in kilometres (haversine).
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

#[derive(Debug, Clone, Copy)]
pub struct Nearby<'a> {
    pub issue: &'a Issue,
    pub distance_km: f64,
}

/// Nearest first. Issues without coordinates are left out.
pub fn sort_by_distance<'a>(
    issues: impl IntoIterator<Item = &'a Issue>,
    origin: Coordinates,
) -> Vec<Nearby<'a>> {
    let mut nearby: Vec<Nearby<'a>> = issues
        .into_iter()
        .filter_map(|issue| {
            issue.coordinates.map(|at| Nearby {
                issue,
                distance_km: distance_km(origin, at),
            })
        })
        .collect();
    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}

pub fn within_radius<'a>(
    issues: impl IntoIterator<Item = &'a Issue>,
    origin: Coordinates,
    radius_km: f64,
) -> Vec<Nearby<'a>> {
    sort_by_distance(issues, origin)
        .into_iter()
        .take_while(|entry| entry.distance_km <= radius_km)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUNE: Coordinates = Coordinates { lat: 18.5204, lng: 73.8567 };
    const DELHI: Coordinates = Coordinates { lat: 28.7041, lng: 77.1025 };
    const CHENNAI: Coordinates = Coordinates { lat: 13.0827, lng: 80.2707 };

    #[test]
    fn distance_to_self_is_zero() {
        for point in [PUNE, DELHI, CHENNAI, FALLBACK_LOCATION] {
            assert_eq!(distance_km(point, point), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let there = distance_km(PUNE, DELHI);
        let back = distance_km(DELHI, PUNE);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn triangle_inequality_holds() {
        let points = [PUNE, DELHI, CHENNAI, FALLBACK_LOCATION];
        for a in points {
            for b in points {
                for c in points {
                    assert!(distance_km(a, c) <= distance_km(a, b) + distance_km(b, c) + 1e-9);
                }
            }
        }
    }

    #[test]
    fn known_distance_mumbai_pune() {
        let km = distance_km(FALLBACK_LOCATION, PUNE);
        assert!((115.0..125.0).contains(&km), "got {km}");
    }
}
