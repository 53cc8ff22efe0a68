use criterion::{black_box, criterion_group, criterion_main, Criterion};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use stubnet::{
    transport_fn, Argument, BasicAuth, BehaviorSet, CallDescriptor, CallFacts, ContentType,
    Engine, EndpointFacts, Metadata, RawResponse, Shape,
};

#[derive(Serialize, Deserialize)]
struct Order {
    id: u64,
    customer: String,
    items: Vec<String>,
}

fn order() -> Order {
    Order {
        id: 42,
        customer: "ada".to_string(),
        items: vec!["tea".to_string(), "scones".to_string(), "jam".to_string()],
    }
}

fn descriptor() -> CallDescriptor {
    CallDescriptor::builder(
        EndpointFacts::new("shop", "http://api.shop.local:8080/v1"),
        CallFacts::new("place_order", Method::POST, "/customers/{customer}/orders")
            .query("source", "bench"),
    )
    .returns(Shape::serde::<Order>())
    .arg(Argument::path("customer", "ada lovelace"))
    .arg(Argument::query_list("tag", vec!["a", "b", "c"]))
    .arg(Argument::header("X-Request-Id", "bench-1"))
    .arg(Argument::serde_entity(order()))
    .metadata(
        Metadata::new().endpoint(
            BehaviorSet::new()
                .header("Accept", "application/json")
                .interceptor(BasicAuth::new("user", "pass"))
                .content(ContentType::Json),
        ),
    )
    .build()
}

fn engine() -> Engine {
    let body = serde_json::to_vec(&order()).unwrap();
    Engine::builder()
        .transport(transport_fn(move |_| {
            Ok(RawResponse::new(StatusCode::OK).with_body(body.clone()))
        }))
        .max_concurrent_calls(1)
        .build()
        .unwrap()
}

fn benchmark_build_request(c: &mut Criterion) {
    let engine = engine();
    let descriptor = descriptor();
    c.bench_function("build_request", |b| {
        b.iter(|| engine.build_request(black_box(&descriptor)).unwrap())
    });
}

fn benchmark_consume_response(c: &mut Criterion) {
    let engine = engine();
    let descriptor = descriptor();
    let response =
        RawResponse::new(StatusCode::OK).with_body(serde_json::to_vec(&order()).unwrap());
    c.bench_function("consume_response", |b| {
        b.iter(|| {
            engine
                .consume_response(black_box(&descriptor), response.clone())
                .unwrap()
        })
    });
}

fn benchmark_invoke(c: &mut Criterion) {
    let engine = engine();
    let descriptor = descriptor();
    c.bench_function("invoke", |b| {
        b.iter(|| engine.invoke(black_box(&descriptor)).unwrap())
    });
}

criterion_group!(
    benches,
    benchmark_build_request,
    benchmark_consume_response,
    benchmark_invoke
);
criterion_main!(benches);
