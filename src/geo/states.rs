use super::Coordinate;

/// Representative point for each of the 27 federative units.
const STATE_CENTROIDS: [(&str, f64, f64); 27] = [
    ("AC", -8.77, -70.55),
    ("AL", -9.62, -36.82),
    ("AP", 1.41, -51.77),
    ("AM", -3.47, -65.10),
    ("BA", -13.29, -41.71),
    ("CE", -5.20, -39.53),
    ("DF", -15.78, -47.93),
    ("ES", -19.19, -40.34),
    ("GO", -15.98, -49.86),
    ("MA", -5.42, -45.44),
    ("MT", -12.64, -55.42),
    ("MS", -20.51, -54.54),
    ("MG", -18.10, -44.38),
    ("PA", -3.79, -52.48),
    ("PB", -7.28, -36.72),
    ("PR", -24.89, -51.55),
    ("PE", -8.38, -37.86),
    ("PI", -6.60, -42.28),
    ("RJ", -22.25, -42.66),
    ("RN", -5.81, -36.59),
    ("RS", -30.17, -53.50),
    ("RO", -10.83, -63.34),
    ("RR", 1.99, -61.33),
    ("SC", -27.45, -50.95),
    ("SP", -22.19, -48.79),
    ("SE", -10.57, -37.45),
    ("TO", -9.46, -48.26),
];

pub fn state_centroid(code: &str) -> Option<Coordinate> {
    let code = code.trim();
    STATE_CENTROIDS
        .iter()
        .find(|(uf, _, _)| uf.eq_ignore_ascii_case(code))
        .map(|&(_, latitude, longitude)| Coordinate {
            latitude,
            longitude,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_state_resolves() {
        let sp = state_centroid("SP").unwrap();
        assert_eq!((sp.latitude, sp.longitude), (-22.19, -48.79));
        assert_eq!(state_centroid("rj").map(|c| c.latitude), Some(-22.25));
    }

    #[test]
    fn unknown_or_sentinel_state_does_not_resolve() {
        assert!(state_centroid("ZZ").is_none());
        assert!(state_centroid("BR").is_none());
        assert!(state_centroid("").is_none());
    }

    #[test]
    fn table_covers_every_federative_unit_once() {
        let mut codes: Vec<&str> = STATE_CENTROIDS.iter().map(|(uf, _, _)| *uf).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 27);
    }
}
