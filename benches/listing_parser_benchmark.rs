//! Listing and detail page parsing throughput

use appdata_explorer_lib::infrastructure::parsing::{DetailParser, ListingParser};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use scraper::Html;

fn sub_listing_page(apps: usize) -> String {
    let mut page = String::from("<html><body><div class=\"cluster\">");
    for i in 0..apps {
        page.push_str(&format!(
            r#"<div class="card"><a class="poRVub" href="/store/apps/details?id=com.example.app{i}"><span>App {i}</span></a></div>"#
        ));
    }
    page.push_str("</div></body></html>");
    page
}

fn listing_page(clusters: usize) -> String {
    let mut page = String::from("<html><body>");
    for i in 0..clusters {
        page.push_str(&format!(
            r#"<section><h2>Cluster {i}</h2><a class="U8Ww7d" href="/store/apps/collection/cluster?clp=c{i}">See more</a></section>"#
        ));
    }
    page.push_str("</body></html>");
    page
}

const DETAIL_PAGE: &str = r#"<html><head>
<script type="application/ld+json">{"@context":"https://schema.org","@type":"SoftwareApplication","name":"Kahoot! Play & Create Quizzes","applicationCategory":"EDUCATION_APPLICATION","contentRating":"Everyone","aggregateRating":{"@type":"AggregateRating","ratingValue":"4.6","ratingCount":"1000000"},"offers":[{"@type":"Offer","price":"0","priceCurrency":"USD"}]}</script>
</head><body><a itemprop="genre" href="/store/apps/category/EDUCATION">Education</a><div>Size</div><div>29M</div></body></html>"#;

fn bench_listing_parser(c: &mut Criterion) {
    let parser = ListingParser::new().unwrap();
    let listing = listing_page(40);
    let sub_listing = sub_listing_page(200);

    c.bench_function("discover_subpages_40_clusters", |b| {
        b.iter(|| {
            let html = Html::parse_document(black_box(&listing));
            parser.discover_subpages(&html, "en", "US")
        });
    });

    c.bench_function("extract_identifiers_200_apps", |b| {
        b.iter(|| {
            let html = Html::parse_document(black_box(&sub_listing));
            parser.extract_identifiers(&html)
        });
    });
}

fn bench_detail_parser(c: &mut Criterion) {
    let parser = DetailParser::new().unwrap();

    c.bench_function("parse_detail_page", |b| {
        b.iter(|| parser.parse(&Html::parse_document(black_box(DETAIL_PAGE))));
    });
}

criterion_group!(benches, bench_listing_parser, bench_detail_parser);
criterion_main!(benches);
