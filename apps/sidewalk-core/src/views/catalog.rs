//! Static seed data rendered by the dashboard before installations report
//! their own figures.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSeed {
    pub id: u32,
    pub name: &'static str,
    pub region: &'static str,
    pub energy_kwh: f64,
    pub efficiency_percent: f64,
    pub pedestrians_per_day: i64,
    pub status: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSeed {
    pub id: u32,
    pub name: &'static str,
    pub energy_kwh: f64,
    pub efficiency_percent: f64,
    pub sidewalks: u32,
    pub population: u64,
    pub trend_percent: f64,
    pub status: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSiteSeed {
    pub id: u32,
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub energy_kwh: f64,
    pub efficiency_percent: f64,
    pub status: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyEnergySeed {
    pub time: &'static str,
    /// Watt-hours produced in the two-hour bucket.
    pub energy_wh: f64,
    pub pedestrians: i64,
}

#[allow(clippy::too_many_arguments)]
const fn location(
    id: u32,
    name: &'static str,
    region: &'static str,
    energy_kwh: f64,
    efficiency_percent: f64,
    pedestrians_per_day: i64,
    status: &'static str,
    latitude: f64,
    longitude: f64,
) -> LocationSeed {
    LocationSeed {
        id,
        name,
        region,
        energy_kwh,
        efficiency_percent,
        pedestrians_per_day,
        status,
        latitude,
        longitude,
    }
}

const KOTA: &str = "Balikpapan Kota";
const TIMUR: &str = "Balikpapan Timur";
const UTARA: &str = "Balikpapan Utara";
const SELATAN: &str = "Balikpapan Selatan";
const BARAT: &str = "Balikpapan Barat";

// Longitudes are stored exactly as surveyed, sign included.
pub const SIDEWALK_LOCATIONS: [LocationSeed; 26] = [
    location(1, "Jl. Ahmad Yani", KOTA, 0.8, 95.0, 850, "excellent", -1.2379, -116.8312),
    location(2, "Jl. Jendral Sudirman", KOTA, 0.6, 92.0, 720, "excellent", -1.2402, -116.8345),
    location(3, "Jl. MT Haryono", KOTA, 0.4, 89.0, 680, "good", -1.2445, -116.8398),
    location(4, "Jl. Marsma R Iswahyudi", KOTA, 0.5, 91.0, 590, "good", -1.2421, -116.8367),
    location(5, "Jl. Gajah Mada", KOTA, 0.3, 88.0, 520, "good", -1.2356, -116.8289),
    location(6, "Jl. Panglima Batur", KOTA, 0.3, 90.0, 480, "good", -1.2389, -116.8334),
    location(7, "Jl. Letjen Suprapto", KOTA, 0.4, 93.0, 620, "excellent", -1.2398, -116.8356),
    location(8, "Jl. Sepinggan Raya", KOTA, 0.4, 87.0, 550, "good", -1.2467, -116.8423),
    location(9, "Jl. Soekarno Hatta", TIMUR, 0.5, 91.0, 780, "excellent", -1.2234, -116.7891),
    location(10, "Jl. Mulawarman", TIMUR, 0.4, 88.0, 650, "good", -1.2267, -116.7923),
    location(11, "Jl. Ruhui Rahayu", TIMUR, 0.5, 89.0, 720, "good", -1.2298, -116.7956),
    location(12, "Jl. Syarifuddin Yoes", TIMUR, 0.4, 86.0, 590, "good", -1.2245, -116.7889),
    location(13, "Jl. Marsda Iswahyudi", TIMUR, 0.5, 92.0, 680, "excellent", -1.2198, -116.7834),
    location(14, "Jl. Pramuka", TIMUR, 0.5, 87.0, 610, "good", -1.2223, -116.7867),
    location(15, "Jl. Veteran", UTARA, 0.4, 85.0, 580, "good", -1.1987, -116.8123),
    location(16, "Jl. Juanda", UTARA, 0.4, 83.0, 520, "fair", -1.2012, -116.8156),
    location(17, "Jl. Diponegoro", UTARA, 0.4, 81.0, 490, "fair", -1.2045, -116.8189),
    location(18, "Jl. Kartini", UTARA, 0.4, 80.0, 460, "fair", -1.1998, -116.8134),
    location(19, "Jl. Antasari", UTARA, 0.5, 84.0, 550, "good", -1.2023, -116.8167),
    location(20, "Jl. Kapten Pierre Tendean", SELATAN, 0.4, 78.0, 420, "fair", -1.2789, -116.8445),
    location(21, "Jl. Gunung Sari", SELATAN, 0.5, 76.0, 450, "fair", -1.2812, -116.8467),
    location(22, "Jl. Flamboyan", SELATAN, 0.4, 74.0, 380, "fair", -1.2834, -116.8489),
    location(23, "Jl. Kenanga", SELATAN, 0.5, 72.0, 410, "maintenance", -1.2856, -116.8512),
    location(24, "Jl. Pupuk Raya", BARAT, 0.3, 65.0, 320, "maintenance", -1.2567, -116.8734),
    location(25, "Jl. Mahkota", BARAT, 0.4, 70.0, 360, "maintenance", -1.2589, -116.8756),
    location(26, "Jl. Mawar", BARAT, 0.4, 68.0, 340, "fair", -1.2612, -116.8778),
];

pub const REGIONS: [RegionSeed; 5] = [
    RegionSeed {
        id: 1,
        name: KOTA,
        energy_kwh: 3.2,
        efficiency_percent: 94.0,
        sidewalks: 8,
        population: 145_000,
        trend_percent: 12.5,
        status: "excellent",
    },
    RegionSeed {
        id: 2,
        name: TIMUR,
        energy_kwh: 2.8,
        efficiency_percent: 89.0,
        sidewalks: 6,
        population: 168_000,
        trend_percent: 8.2,
        status: "good",
    },
    RegionSeed {
        id: 3,
        name: UTARA,
        energy_kwh: 2.1,
        efficiency_percent: 82.0,
        sidewalks: 5,
        population: 142_000,
        trend_percent: 3.1,
        status: "good",
    },
    RegionSeed {
        id: 4,
        name: SELATAN,
        energy_kwh: 1.8,
        efficiency_percent: 75.0,
        sidewalks: 4,
        population: 98_000,
        trend_percent: -2.4,
        status: "fair",
    },
    RegionSeed {
        id: 5,
        name: BARAT,
        energy_kwh: 1.5,
        efficiency_percent: 68.0,
        sidewalks: 3,
        population: 89_000,
        trend_percent: -5.1,
        status: "maintenance",
    },
];

pub const MAP_SITES: [MapSiteSeed; 6] = [
    MapSiteSeed {
        id: 1,
        name: "Jl. Jenderal Sudirman",
        latitude: -1.2379,
        longitude: 116.8529,
        energy_kwh: 3.2,
        efficiency_percent: 94.0,
        status: "optimal",
    },
    MapSiteSeed {
        id: 2,
        name: "Jl. Ahmad Yani",
        latitude: -1.2675,
        longitude: 116.8314,
        energy_kwh: 2.1,
        efficiency_percent: 82.0,
        status: "good",
    },
    MapSiteSeed {
        id: 3,
        name: "Jl. MT Haryono",
        latitude: -1.2462,
        longitude: 116.8613,
        energy_kwh: 2.8,
        efficiency_percent: 89.0,
        status: "optimal",
    },
    MapSiteSeed {
        id: 4,
        name: "Jl. Marsma R. Iswahyudi",
        latitude: -1.2533,
        longitude: 116.8442,
        energy_kwh: 1.5,
        efficiency_percent: 68.0,
        status: "maintenance",
    },
    MapSiteSeed {
        id: 5,
        name: "Jl. Sepinggan",
        latitude: -1.2174,
        longitude: 116.8942,
        energy_kwh: 3.5,
        efficiency_percent: 96.0,
        status: "optimal",
    },
    MapSiteSeed {
        id: 6,
        name: "Jl. Soekarno Hatta",
        latitude: -1.2281,
        longitude: 116.8456,
        energy_kwh: 2.4,
        efficiency_percent: 85.0,
        status: "good",
    },
];

const fn hour(time: &'static str, energy_wh: f64, pedestrians: i64) -> HourlyEnergySeed {
    HourlyEnergySeed {
        time,
        energy_wh,
        pedestrians,
    }
}

pub const HOURLY_ENERGY: [HourlyEnergySeed; 12] = [
    hour("00:00", 120.0, 45),
    hour("02:00", 80.0, 20),
    hour("04:00", 60.0, 15),
    hour("06:00", 200.0, 80),
    hour("08:00", 450.0, 180),
    hour("10:00", 380.0, 150),
    hour("12:00", 420.0, 165),
    hour("14:00", 320.0, 130),
    hour("16:00", 380.0, 155),
    hour("18:00", 520.0, 210),
    hour("20:00", 360.0, 145),
    hour("22:00", 240.0, 95),
];
