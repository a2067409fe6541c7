//! Demo catalogue for development mode

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::aggregates::charity::VerificationStatus;
use crate::domain::aggregates::{Category, Charity, CharityForm, DiscountCode, Product, Seller, SellerRegistration};
use crate::domain::value_objects::Money;
use crate::pricing;

/// The demo seller is also a signed-in user with this id.
pub const DEMO_SELLER_ID: Uuid = Uuid::from_u128(0x7777_7777_7777_7777_7777_7777_7777_7777);

pub struct Seed {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub discounts: Vec<DiscountCode>,
    pub sellers: Vec<Seller>,
    pub charities: Vec<Charity>,
}

fn category(name: &str, description: &str) -> Category {
    Category::new(name, Some(description.to_string()))
}

pub fn demo() -> Seed {
    let categories = vec![
        category("Electronics", "Phones, laptops and gadgets"),
        category("Fashion", "Clothing, shoes and traditional wear"),
        category("Home & Garden", "Kitchen appliances and home essentials"),
        category("Sports", "Fitness gear and outdoor equipment"),
        category("Books", "Fiction, education and more"),
    ];
    let cat = |name: &str| categories.iter().find(|c| c.name == name).map(|c| c.id);
    let now = Utc::now();
    let listings: [(u128, &str, i64, Option<i64>, &str, u32, &str, bool); 6] = [
        (0x1111_1111_1111_1111_1111_1111_1111_1111, "Samsung Galaxy A54 5G - 128GB Storage, 6GB RAM", 89999, Some(99999), "Electronics", 15,
            "https://images.unsplash.com/photo-1511707171634-5f897ff02aa9?w=400", true),
        (0x2222_2222_2222_2222_2222_2222_2222_2222, "Nike Air Force 1 Original White Sneakers", 12500, Some(15000), "Fashion", 25,
            "https://images.unsplash.com/photo-1549298916-b41d501d3772?w=400", false),
        (0x3333_3333_3333_3333_3333_3333_3333_3333, "HP Pavilion 15.6\" Laptop Intel Core i5", 145000, None, "Electronics", 8,
            "https://images.unsplash.com/photo-1496181133206-80ce9b88a853?w=400", true),
        (0x4444_4444_4444_4444_4444_4444_4444_4444, "Uniqlo Men's Cotton T-Shirt Pack of 3", 3500, Some(4500), "Fashion", 30,
            "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?w=400", false),
        (0x5555_5555_5555_5555_5555_5555_5555_5555, "Philips Air Fryer XXL Digital 7.3L", 35000, None, "Home & Garden", 12,
            "https://images.unsplash.com/photo-1556909114-f6e7ad7d3136?w=400", false),
        (0x6666_6666_6666_6666_6666_6666_6666_6666, "Traditional Pakistani Kurta", 4500, None, "Fashion", 20,
            "https://images.unsplash.com/photo-1594633312681-425c7b97ccd1?w=400", false),
    ];
    let products = listings.iter().enumerate().map(|(i, (id, name, price, original, category_name, stock, image, demo_seller))| {
        let created_at = now - Duration::minutes(i as i64);
        Product {
            id: Uuid::from_u128(*id), seller_id: demo_seller.then_some(DEMO_SELLER_ID), category_id: cat(category_name),
            name: name.to_string(), description: None, price: Money::from_major(*price), original_price: original.map(Money::from_major),
            stock_quantity: *stock, image_url: Some(image.to_string()), is_active: true, created_at, updated_at: created_at,
        }
    }).collect();

    let seller = Seller::register(DEMO_SELLER_ID, "seller@shoppak.pk".into(), SellerRegistration {
        email: None, full_name: "Ahmed Khan".into(), business_name: "TechHub Pakistan".into(), phone: "+92-300-1234567".into(),
        address: "123 Main Street".into(), city: "Karachi".into(), business_type: "Electronics".into(),
        tax_id: "NTN-1234567-8".into(), agreed_to_terms: true,
    });

    let charities = [
        ("Edhi Foundation", "Providing emergency medical services and social welfare", "Healthcare", 500000, 125000),
        ("Shaukat Khanum Memorial", "Cancer treatment and research center", "Healthcare", 1000000, 750000),
        ("Saylani Welfare", "Food distribution and social services", "Social Welfare", 300000, 180000),
        ("TCF Foundation", "Quality education for underprivileged children", "Education", 800000, 450000),
        ("WaterAid Pakistan", "Clean water and sanitation projects", "Environment", 400000, 220000),
        ("Shelter Homes", "Housing for homeless families", "Housing", 600000, 320000),
    ]
    .into_iter()
    .map(|(name, description, category, target, raised)| {
        let mut charity = Charity::create(CharityForm {
            name: name.into(), description: Some(description.into()), category: category.into(),
            target_amount: Some(Money::from_major(target)), verification_status: Some(VerificationStatus::Verified), is_active: true,
            ..Default::default()
        });
        charity.raised_amount = Money::from_major(raised);
        charity
    })
    .collect();

    Seed { categories, products, discounts: pricing::seed_codes(), sellers: vec![seller], charities }
}
