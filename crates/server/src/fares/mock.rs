//! Static fare data for modes without a live provider.
//!
//! Buses and cars only serve routes whose city list contains both the source
//! and the destination (case-insensitive substring match).

use chrono::Utc;
use rand::Rng;
use serde_json::{Value, json};

struct Bus {
    id: &'static str,
    operator: &'static str,
    bus_type: &'static str,
    departure: &'static str,
    arrival: &'static str,
    duration: &'static str,
    price: u32,
    seats: u32,
    route: &'static [&'static str],
}

const BUSES: &[Bus] = &[
    Bus {
        id: "bus-1",
        operator: "RedBus Express",
        bus_type: "AC Sleeper",
        departure: "22:00",
        arrival: "06:00",
        duration: "8h 0m",
        price: 1200,
        seats: 12,
        route: &["Delhi", "Mumbai", "Pune", "Bangalore", "Chennai", "Kolkata", "Hyderabad", "Ahmedabad"],
    },
    Bus {
        id: "bus-2",
        operator: "Travels India",
        bus_type: "AC Semi-Sleeper",
        departure: "23:30",
        arrival: "07:30",
        duration: "8h 0m",
        price: 1000,
        seats: 8,
        route: &["Delhi", "Jaipur", "Mumbai", "Pune", "Goa", "Bangalore"],
    },
    Bus {
        id: "bus-3",
        operator: "Express Tours",
        bus_type: "Non-AC Sleeper",
        departure: "20:00",
        arrival: "05:00",
        duration: "9h 0m",
        price: 800,
        seats: 15,
        route: &["Mumbai", "Pune", "Hyderabad", "Bangalore", "Chennai"],
    },
];

struct Car {
    id: &'static str,
    model: &'static str,
    car_type: &'static str,
    price_per_km: u32,
    distance_km: u32,
    route: &'static [&'static str],
}

const CARS: &[Car] = &[
    Car {
        id: "car-1",
        model: "Sedan - Swift Dzire",
        car_type: "AC",
        price_per_km: 12,
        distance_km: 300,
        route: &["Delhi", "Mumbai", "Pune", "Bangalore", "Chennai", "Kolkata", "Hyderabad"],
    },
    Car {
        id: "car-2",
        model: "SUV - Innova",
        car_type: "AC",
        price_per_km: 15,
        distance_km: 280,
        route: &["Delhi", "Jaipur", "Mumbai", "Pune", "Goa", "Bangalore"],
    },
    Car {
        id: "car-3",
        model: "Hatchback - Alto",
        car_type: "Non-AC",
        price_per_km: 8,
        distance_km: 320,
        route: &["Mumbai", "Pune", "Hyderabad", "Bangalore", "Chennai", "Cochin"],
    },
];

/// (name, number, price, departure, arrival, duration, class)
const TRAINS: &[(&str, &str, u32, &str, &str, &str, &str)] = &[
    ("Rajdhani Express", "12951", 800, "16:55", "08:10", "15h 15m", "3A"),
    ("Shatabdi Express", "12002", 900, "06:00", "14:30", "8h 30m", "CC"),
    ("Duronto Express", "12259", 750, "22:50", "12:35", "13h 45m", "SL"),
];

fn serves(route: &[&str], source: &str, destination: &str) -> bool {
    let (source, destination) = (source.to_lowercase(), destination.to_lowercase());
    let stops = |needle: &str| route.iter().any(|city| city.to_lowercase().contains(needle));
    stops(&source) && stops(&destination)
}

fn booking_id(prefix: &str) -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect();
    format!("{prefix}-{suffix}")
}

pub fn trains(source: &str, destination: &str, date: Option<&str>) -> Vec<Value> {
    let stamp = Utc::now().timestamp_millis();
    TRAINS
        .iter()
        .enumerate()
        .map(|(i, (name, number, price, departure, arrival, duration, class))| {
            json!({
                "id": format!("train-{stamp}-{}", i + 1),
                "trainName": name,
                "trainNumber": number,
                "from": source,
                "to": destination,
                "date": date,
                "price": price,
                "departureTime": departure,
                "arrivalTime": arrival,
                "duration": duration,
                "class": class,
            })
        })
        .collect()
}

pub fn buses(source: &str, destination: &str) -> Vec<Value> {
    let mut rng = rand::thread_rng();
    BUSES
        .iter()
        .filter(|bus| serves(bus.route, source, destination))
        .map(|bus| {
            let rating: f64 = rng.gen_range(3.0..5.0);
            json!({
                "id": bus.id,
                "operatorName": bus.operator,
                "busType": bus.bus_type,
                "departureTime": bus.departure,
                "arrivalTime": bus.arrival,
                "duration": bus.duration,
                "price": bus.price,
                "seatsAvailable": bus.seats,
                "route": bus.route,
                "bookingId": booking_id("BUS"),
                "amenities": ["AC", "WiFi", "Charging Port", "Water Bottle"],
                "rating": format!("{rating:.1}"),
            })
        })
        .collect()
}

pub fn cars(source: &str, destination: &str) -> Vec<Value> {
    CARS.iter()
        .filter(|car| serves(car.route, source, destination))
        .map(|car| {
            json!({
                "id": car.id,
                "carModel": car.model,
                "carType": car.car_type,
                "pricePerKm": car.price_per_km,
                "estimatedDistance": car.distance_km,
                "route": car.route,
                "totalPrice": car.price_per_km * car.distance_km,
                "bookingId": booking_id("CAR"),
                "driver": "Professional Driver Included",
                "fuel": "Fuel Included",
                "estimatedTime": format!("{}h {}m", car.distance_km.div_ceil(60), car.distance_km % 60),
                "features": ["AC", "Music System", "GPS Navigation", "First Aid Kit"],
            })
        })
        .collect()
}
