// src/utils/geo.rs

/// Great-circle distance between two points, in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let earth_radius_km = 6371.0;
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    earth_radius_km * c
}

/// Raw coordinate-delta hypot, used only as the ranking key for nearby
/// drivers. Not a distance in any unit; good enough to order candidates at
/// city range and cheap to compute over the whole registry.
pub fn planar_delta(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    (lat1 - lat2).hypot(lng1 - lng2)
}

/// Duration estimate from a conservative urban average speed of 30 km/h.
pub fn estimate_duration_min(distance_km: f64) -> i32 {
    let average_speed_kmh = 30.0;
    ((distance_km / average_speed_kmh) * 60.0) as i32
}
