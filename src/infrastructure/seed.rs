//! Demo catalog loaded into a fresh store.

use chrono::{DateTime, TimeZone, Utc};
use crate::domain::aggregates::product::{Category, Product, Variant, VariantOption};
use crate::domain::value_objects::{Money, Sku};
use crate::{EcommerceError, Result};

struct Listing {
    id: u32,
    name: &'static str,
    short: &'static str,
    description: &'static str,
    image: &'static str,
    category: &'static str,
    brand: &'static str,
    tags: &'static [&'static str],
    rating: f32,
    reviews: u32,
    featured: bool,
    new: bool,
    bestselling: bool,
    created: (i32, u32, u32),
    updated: (i32, u32, u32),
}

const IMG: &str = "https://images.unsplash.com/photo-";

fn day((y, m, d): (i32, u32, u32)) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single().unwrap_or_default()
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Demo variants are numbered; the SKU code is that number.
fn sku(n: u32) -> Result<Sku> {
    Sku::new(n.to_string()).map_err(|e| EcommerceError::Validation(e.to_string()))
}

/// One variant per attribute value, priced individually.
fn single(base: u32, attr: &str, rows: &[(&str, i64, u32)]) -> Result<(Vec<Variant>, Vec<VariantOption>)> {
    let mut variants = Vec::with_capacity(rows.len());
    for (i, (name, cents, stock)) in rows.iter().enumerate() {
        let n = base + i as u32 + 1;
        variants.push(Variant::new(format!("var-{n}"), *name, sku(n)?, Money::cents(*cents), *stock)
            .with_attribute(attr.to_lowercase(), *name));
    }
    let option = VariantOption { name: attr.to_string(), values: rows.iter().map(|r| r.0.to_string()).collect() };
    Ok((variants, vec![option]))
}

/// Size x colour grid at one base price. Stock levels vary per cell but are
/// fixed so a fresh store always starts from the same numbers.
fn grid(base: u32, cents: i64, sizes: &[&str], colors: &[&str]) -> Result<(Vec<Variant>, Vec<VariantOption>)> {
    let mut variants = Vec::with_capacity(sizes.len() * colors.len());
    for size in sizes {
        for color in colors {
            let i = variants.len() as u32;
            let n = base + i + 1;
            let mut variant = Variant::new(format!("var-{n}"), format!("{size} / {color}"), sku(n)?, Money::cents(cents), 5 + (i * 17 + base / 100) % 46)
                .with_attribute("size", *size)
                .with_attribute("color", *color);
            if i % 4 == 3 {
                variant = variant.with_compare_at_price(Money::cents(cents + 2000));
            }
            variants.push(variant);
        }
    }
    let values = |v: &[&str]| -> Vec<String> { v.iter().map(|s| s.to_string()).collect() };
    let options = vec![
        VariantOption { name: "Size".into(), values: values(sizes) },
        VariantOption { name: "Color".into(), values: values(colors) },
    ];
    Ok((variants, options))
}

fn build(l: Listing, (variants, variant_options): (Vec<Variant>, Vec<VariantOption>)) -> Product {
    let image = format!("{IMG}{}?w=600&h=750&fit=crop", l.image);
    Product {
        id: l.id,
        name: l.name.to_string(),
        slug: slugify(l.name),
        description: l.description.to_string(),
        short_description: l.short.to_string(),
        images: vec![image.clone()],
        image,
        category: l.category.to_string(),
        subcategory: None,
        brand: Some(l.brand.to_string()),
        tags: l.tags.iter().map(|t| t.to_string()).collect(),
        rating: l.rating,
        reviews: l.reviews,
        variants,
        variant_options,
        featured: l.featured,
        new: l.new,
        bestselling: l.bestselling,
        created_at: day(l.created),
        updated_at: day(l.updated),
    }
}

pub fn demo_products() -> Result<Vec<Product>> {
    let xs_xl = ["XS", "S", "M", "L", "XL"];
    Ok(vec![
        build(Listing {
            id: 1, name: "Vintage Denim Jacket", short: "Classic vintage denim with modern fit",
            description: "Vintage-wash denim jacket cut for layering, with distressed details and stretch denim.",
            image: "1551028719-00167b16eac5", category: "Outerwear", brand: "Heritage Denim Co.",
            tags: &["vintage", "denim", "casual", "layering"], rating: 4.8, reviews: 124,
            featured: true, new: false, bestselling: true, created: (2024, 1, 15), updated: (2024, 6, 20),
        }, grid(1000, 8999, &xs_xl, &["Vintage Wash", "Dark Indigo", "Light Stone"])?),
        build(Listing {
            id: 2, name: "Handwoven Market Tote", short: "Artisan seagrass tote with cotton lining",
            description: "Market tote woven from natural seagrass with a cotton-lined interior.",
            image: "1590874103328-eac38a683ce7", category: "Accessories", brand: "Artisan Collective",
            tags: &["handmade", "sustainable", "artisan", "summer"], rating: 4.9, reviews: 89,
            featured: true, new: false, bestselling: false, created: (2024, 2, 1), updated: (2024, 5, 15),
        }, single(2000, "Color", &[("Natural", 4800, 23), ("Whitewash", 5200, 15)])?),
        build(Listing {
            id: 3, name: "Organic Cotton T-Shirt", short: "Premium organic cotton, relaxed fit",
            description: "Relaxed-fit tee in certified organic cotton, pre-washed for softness.",
            image: "1521572163474-6864f9cf17ab", category: "Tops", brand: "Conscious Basics",
            tags: &["organic", "cotton", "basics", "sustainable"], rating: 4.7, reviews: 256,
            featured: false, new: false, bestselling: true, created: (2024, 1, 1), updated: (2024, 6, 1),
        }, grid(3000, 3499, &["XS", "S", "M", "L", "XL", "XXL"], &["Off-White", "Clay", "Sage", "Charcoal"])?),
        build(Listing {
            id: 4, name: "Ceramic Pour-Over Set", short: "Handmade ceramic coffee brewing set",
            description: "Hand-thrown dripper, carafe and two cups for slow morning coffee.",
            image: "1495474472287-4d71bcdd2085", category: "Home", brand: "Morning Rituals",
            tags: &["ceramic", "coffee", "handmade", "kitchen"], rating: 4.9, reviews: 67,
            featured: true, new: true, bestselling: false, created: (2024, 3, 1), updated: (2024, 6, 15),
        }, single(4000, "Color", &[("Cream", 6500, 18), ("Speckled Grey", 6800, 12), ("Matte Black", 7000, 8)])?),
        build(Listing {
            id: 5, name: "Linen Blend Trousers", short: "Breathable linen-cotton blend",
            description: "Easy wide-leg trousers in a breathable linen and cotton blend.",
            image: "1594938298603-c8148c4dae35", category: "Bottoms", brand: "Summer House",
            tags: &["linen", "summer", "relaxed", "breathable"], rating: 4.6, reviews: 98,
            featured: false, new: false, bestselling: false, created: (2024, 2, 15), updated: (2024, 5, 20),
        }, grid(5000, 7800, &["28", "30", "32", "34", "36"], &["Natural", "Sand", "Navy"])?),
        build(Listing {
            id: 6, name: "Beeswax Candle Set", short: "Set of 3 natural beeswax candles",
            description: "Pure beeswax pillar candles with cotton wicks and a honeyed scent.",
            image: "1603006905003-be475563bc59", category: "Home", brand: "Hive & Harvest",
            tags: &["beeswax", "natural", "gift", "home"], rating: 4.8, reviews: 143,
            featured: false, new: false, bestselling: true, created: (2024, 1, 20), updated: (2024, 4, 10),
        }, single(6000, "Set", &[("Classic Set", 4200, 67), ("Gift Box", 5500, 34)])?),
        build(Listing {
            id: 7, name: "Leather Crossbody Bag", short: "Full-grain leather, brass hardware",
            description: "Compact crossbody in full-grain leather with an adjustable strap.",
            image: "1548036328-c9fa89d128fa", category: "Accessories", brand: "Saddle & Stitch",
            tags: &["leather", "handcrafted", "classic", "everyday"], rating: 4.9, reviews: 201,
            featured: true, new: false, bestselling: true, created: (2024, 1, 1), updated: (2024, 6, 1),
        }, single(7000, "Color", &[("Cognac", 14500, 12), ("Black", 14500, 18), ("Tan", 14900, 8)])?),
        build(Listing {
            id: 8, name: "Stone Washed Bedding Set", short: "100% linen, queen size set",
            description: "Stone-washed linen duvet cover and pillowcases that soften with every wash.",
            image: "1522771739844-6a9f6d5f14af", category: "Home", brand: "Rest & Renew",
            tags: &["linen", "bedding", "luxury", "home"], rating: 4.9, reviews: 45,
            featured: false, new: false, bestselling: false, created: (2024, 2, 1), updated: (2024, 5, 1),
        }, single(8000, "Size", &[("Queen / Natural", 22000, 8), ("Queen / White", 22000, 5), ("King / Natural", 28000, 4)])?),
        build(Listing {
            id: 9, name: "Canvas Sneakers", short: "Classic canvas with memory foam",
            description: "Low-top canvas sneakers with a memory foam footbed and natural rubber sole.",
            image: "1525966222134-fcfa99b8ae77", category: "Footwear", brand: "Grounded",
            tags: &["canvas", "comfortable", "everyday", "sustainable"], rating: 4.5, reviews: 234,
            featured: false, new: false, bestselling: true, created: (2024, 1, 1), updated: (2024, 6, 1),
        }, grid(9000, 7200, &["6", "7", "8", "9", "10", "11"], &["Off-White", "Natural Grey", "Navy"])?),
        build(Listing {
            id: 10, name: "Hand-Poured Soap Bar", short: "Natural lavender, cold-process",
            description: "Cold-process soap made in small batches with plant oils.",
            image: "1600857544200-b2f666a9a2ec", category: "Body Care", brand: "Botanica",
            tags: &["natural", "lavender", "handmade", "skincare"], rating: 4.9, reviews: 312,
            featured: false, new: false, bestselling: true, created: (2024, 1, 1), updated: (2024, 5, 1),
        }, single(10000, "Scent", &[("Lavender", 1200, 156), ("Eucalyptus", 1200, 89), ("Unscented", 1000, 67)])?),
        build(Listing {
            id: 11, name: "Cashmere Beanie", short: "100% cashmere, hand-knit",
            description: "Hand-knit beanie in soft cashmere with a folded cuff.",
            image: "1576871337622-98d48d1cf531", category: "Accessories", brand: "Highland Knits",
            tags: &["cashmere", "luxury", "warm", "winter"], rating: 4.8, reviews: 156,
            featured: true, new: false, bestselling: false, created: (2024, 2, 1), updated: (2024, 5, 1),
        }, single(11000, "Color", &[("Oatmeal", 5500, 28), ("Charcoal", 5500, 34), ("Blush", 5500, 15)])?),
        build(Listing {
            id: 12, name: "Merino Wool Sweater", short: "Ultra-soft merino, relaxed fit",
            description: "Fine-gauge merino crew neck that works on its own or layered.",
            image: "1620799140408-edc6dcb6d633", category: "Tops", brand: "Wool & Wire",
            tags: &["merino", "wool", "versatile", "basics"], rating: 4.8, reviews: 189,
            featured: false, new: true, bestselling: true, created: (2024, 4, 1), updated: (2024, 6, 15),
        }, grid(12000, 9800, &xs_xl, &["Ivory", "Dusty Rose", "Navy", "Camel"])?),
        build(Listing {
            id: 13, name: "Organic Body Oil", short: "Jojoba & almond blend, citrus scent",
            description: "Lightweight body oil of jojoba and sweet almond with a citrus finish.",
            image: "1608571423902-eed4a5ad8108", category: "Body Care", brand: "Botanica",
            tags: &["organic", "nourishing", "natural", "skincare"], rating: 4.8, reviews: 178,
            featured: false, new: false, bestselling: false, created: (2024, 2, 1), updated: (2024, 5, 1),
        }, single(13000, "Size", &[("4 oz", 3200, 89), ("8 oz", 5200, 45)])?),
    ])
}

pub fn demo_categories(products: &[Product]) -> Vec<Category> {
    [
        ("tops", "Tops", "Premium tops and shirts", "1521572163474-6864f9cf17ab"),
        ("outerwear", "Outerwear", "Jackets and coats for every season", "1551028719-00167b16eac5"),
        ("bottoms", "Bottoms", "Trousers, jeans, and shorts", "1594938298603-c8148c4dae35"),
        ("accessories", "Accessories", "Bags, belts, and more", "1548036328-c9fa89d128fa"),
        ("footwear", "Footwear", "Shoes and boots", "1525966222134-fcfa99b8ae77"),
        ("home", "Home", "Home decor and essentials", "1555041469-a586c61ea9bc"),
        ("body-care", "Body Care", "Natural skincare and body products", "1608571423902-eed4a5ad8108"),
    ]
    .into_iter()
    .map(|(id, name, description, image)| Category {
        id: id.to_string(),
        name: name.to_string(),
        slug: id.to_string(),
        description: description.to_string(),
        image: format!("{IMG}{image}?w=400&h=300&fit=crop"),
        product_count: products.iter().filter(|p| p.category == name).count() as u32,
    })
    .collect()
}
