pub struct DemoShipment {
    pub sender_name: &'static str,
    pub sender_address: &'static str,
    pub sender_city: &'static str,
    pub receiver_name: &'static str,
    pub receiver_address: &'static str,
    pub receiver_city: &'static str,
    pub service: &'static str,
    pub weight_kg: f64,
    pub delivery_days: u32,
    /// How far along the canonical steps the seeded record is moved.
    pub advance_to: &'static str,
}

pub struct DemoConfig {
    pub shipments: &'static [DemoShipment],
}

pub const DEMO: DemoConfig = DemoConfig {
    shipments: &[
        DemoShipment {
            sender_name: "Ada Byron",
            sender_address: "12 Harbour Road",
            sender_city: "Portsmouth",
            receiver_name: "Charles Babbage",
            receiver_address: "1 Dorset Street",
            receiver_city: "London",
            service: "ground",
            weight_kg: 2.5,
            delivery_days: 5,
            advance_to: "In Transit",
        },
        DemoShipment {
            sender_name: "Grace Hopper",
            sender_address: "45 Navy Yard",
            sender_city: "Arlington",
            receiver_name: "Alan Turing",
            receiver_address: "8 Bletchley Park",
            receiver_city: "Milton Keynes",
            service: "air",
            weight_kg: 1.2,
            delivery_days: 2,
            advance_to: "Out for Delivery",
        },
        DemoShipment {
            sender_name: "Edsger Dijkstra",
            sender_address: "3 Canal Street",
            sender_city: "Rotterdam",
            receiver_name: "Barbara Liskov",
            receiver_address: "77 Mass Ave",
            receiver_city: "Cambridge",
            service: "ocean",
            weight_kg: 40.0,
            delivery_days: 14,
            advance_to: "Delivered",
        },
    ],
};
