//! Model-code lookup table (spec.md §4.K). The hand controller reports a
//! single byte from `m`; this maps it to the name ASCOM clients display.

pub fn model_name(code: u8) -> &'static str {
    match code {
        1 => "GPS Series",
        3 => "i-Series",
        4 => "i-Series SE",
        5 => "CGE",
        6 => "Advanced GT",
        7 => "SLT",
        9 => "CPC",
        10 => "GT",
        11 => "4/5 SE",
        12 => "6/8 SE",
        13 => "GCE Pro",
        14 => "CGEM DX",
        15 => "LCM",
        16 => "Sky Prodigy",
        17 => "CPC Deluxe",
        18 => "GT 16",
        19 => "StarSeeker",
        20 => "Advanced VX",
        21 => "Cosmos",
        22 => "Evolution",
        23 => "CGX",
        24 => "CGXL",
        25 => "Astrofi",
        26 => "SkyWatcher",
        _ => "Unknown model",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve() {
        assert_eq!(model_name(6), "Advanced GT");
        assert_eq!(model_name(22), "Evolution");
    }

    #[test]
    fn unknown_code_falls_back() {
        assert_eq!(model_name(200), "Unknown model");
    }
}
