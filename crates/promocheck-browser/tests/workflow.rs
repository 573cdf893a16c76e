use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use promocheck_browser::{read_price, BrowserError, BrowserSession, SessionLauncher, Workflow};
use promocheck_core::{
    PriceReading, StorefrontCatalog, StorefrontProfile, ValidationRequest, Verdict,
    PROMO_INPUT_NOT_FOUND,
};
use url::Url;

const STORE: &str = "https://www.noon.com/saudi-en/";
const PRODUCT: &str = "https://www.noon.com/saudi-en/some-product/N123/p/";

/// What the fake storefront shows.
#[derive(Debug, Clone)]
struct Storefront {
    product_price: Option<&'static str>,
    add_to_cart_button: bool,
    cart_reachable: bool,
    promo_input: bool,
    apply_button: bool,
    total_after_apply: Option<&'static str>,
    error_after_apply: Option<&'static str>,
    type_fails: bool,
    promo_lookup_fails: bool,
    apply_lookup_fails: bool,
}

impl Default for Storefront {
    fn default() -> Self {
        Self {
            product_price: Some("SAR 100"),
            add_to_cart_button: true,
            cart_reachable: true,
            promo_input: true,
            apply_button: true,
            total_after_apply: Some("SAR 80"),
            error_after_apply: None,
            type_fails: false,
            promo_lookup_fails: false,
            apply_lookup_fails: false,
        }
    }
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Mutex<Vec<String>>,
    closes: AtomicUsize,
    launches: AtomicUsize,
}

impl Recorder {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

struct ScriptedSession {
    page: Storefront,
    selectors: StorefrontProfile,
    recorder: Arc<Recorder>,
    applied: bool,
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &Url) -> Result<(), BrowserError> {
        self.recorder.record(format!("navigate {url}"));
        if url.path().ends_with("/cart/") && !self.page.cart_reachable {
            return Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_secs: 30,
            });
        }
        Ok(())
    }

    async fn element_exists(&mut self, selector: &str) -> Result<bool, BrowserError> {
        let s = &self.selectors.selectors;
        let lookup_fails = (selector == s.promo_input && self.page.promo_lookup_fails)
            || (selector == s.apply_button && self.page.apply_lookup_fails);
        if lookup_fails {
            return Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
                reason: "Execution context was destroyed".to_string(),
            });
        }
        Ok(if selector == s.promo_input {
            self.page.promo_input
        } else if selector == s.apply_button {
            self.page.apply_button
        } else {
            false
        })
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        self.recorder.record(format!("click {selector}"));
        let s = &self.selectors.selectors;
        if selector == s.add_to_cart && !self.page.add_to_cart_button {
            return Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
                reason: "no node".to_string(),
            });
        }
        if selector == s.apply_button {
            self.applied = true;
        }
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.recorder.record(format!("type {selector} {text}"));
        if self.page.type_fails {
            return Err(BrowserError::Input("input detached".to_string()));
        }
        Ok(())
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BrowserError> {
        self.recorder.record(format!("press {key}"));
        self.applied = true;
        Ok(())
    }

    async fn text_content(&mut self, selector: &str) -> Result<Option<String>, BrowserError> {
        let s = &self.selectors.selectors;
        let text = if selector == s.price {
            self.page.product_price
        } else if selector == s.total && self.applied {
            self.page.total_after_apply
        } else if selector == s.error && self.applied {
            self.page.error_after_apply
        } else {
            None
        };
        Ok(text.map(str::to_string))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.recorder.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct ScriptedLauncher {
    page: Storefront,
    recorder: Arc<Recorder>,
    fail_with: Option<&'static str>,
}

#[async_trait]
impl SessionLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        self.recorder.launches.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.fail_with {
            return Err(BrowserError::Launch(reason.to_string()));
        }
        Ok(Box::new(ScriptedSession {
            page: self.page.clone(),
            selectors: StorefrontProfile::noon_saudi(),
            recorder: Arc::clone(&self.recorder),
            applied: false,
        }))
    }
}

fn workflow(page: Storefront) -> (Workflow, Arc<Recorder>) {
    workflow_with(page, None)
}

fn workflow_with(page: Storefront, fail_with: Option<&'static str>) -> (Workflow, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let launcher = ScriptedLauncher {
        page,
        recorder: Arc::clone(&recorder),
        fail_with,
    };
    let workflow = Workflow::new(
        Arc::new(launcher),
        Arc::new(StorefrontCatalog::builtin()),
    );
    (workflow, recorder)
}

fn request(code: &str) -> ValidationRequest {
    ValidationRequest::parse(STORE, code, PRODUCT, None).unwrap()
}

#[tokio::test(start_paused = true)]
async fn discounted_total_passes() {
    let (workflow, recorder) = workflow(Storefront::default());

    let result = workflow.validate(&request("SAVE20")).await;

    assert_eq!(result.valid(), Verdict::Pass);
    assert_eq!(result.original_price().map(PriceReading::as_str), Some("SAR 100"));
    assert_eq!(result.final_price().map(PriceReading::as_str), Some("SAR 80"));
    assert_eq!(result.error_message(), Some("None"));
    assert_eq!(result.reason(), None);
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn visits_product_then_cart_on_store_origin() {
    let (workflow, recorder) = workflow(Storefront::default());

    workflow.validate(&request("SAVE20")).await;

    let profile = StorefrontProfile::noon_saudi();
    let calls = recorder.calls();
    assert_eq!(
        calls,
        vec![
            format!("navigate {PRODUCT}"),
            format!("click {}", profile.selectors.add_to_cart),
            "navigate https://www.noon.com/saudi-en/cart/".to_string(),
            format!("type {} SAVE20", profile.selectors.promo_input),
            format!("click {}", profile.selectors.apply_button),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn missing_promo_input_short_circuits() {
    let page = Storefront {
        promo_input: false,
        ..Storefront::default()
    };
    let (workflow, recorder) = workflow(page);

    let result = workflow.validate(&request("SAVE20")).await;

    assert_eq!(result.valid(), Verdict::Error);
    assert_eq!(result.reason(), Some(PROMO_INPUT_NOT_FOUND));
    assert_eq!(result.original_price().map(PriceReading::as_str), Some("SAR 100"));
    assert_eq!(result.final_price(), Some(&PriceReading::Missing));
    assert!(!recorder.calls().iter().any(|c| c.starts_with("type ")));
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_promo_input_wins_over_missing_price() {
    let page = Storefront {
        product_price: None,
        add_to_cart_button: false,
        cart_reachable: false,
        promo_input: false,
        ..Storefront::default()
    };
    let (workflow, _) = workflow(page);

    let result = workflow.validate(&request("SAVE20")).await;

    assert_eq!(result.valid(), Verdict::Error);
    assert_eq!(result.reason(), Some(PROMO_INPUT_NOT_FOUND));
    assert_eq!(result.original_price(), Some(&PriceReading::Missing));
}

#[tokio::test(start_paused = true)]
async fn missing_apply_button_falls_back_to_enter() {
    let page = Storefront {
        apply_button: false,
        total_after_apply: Some("SAR 100"),
        ..Storefront::default()
    };
    let (workflow, recorder) = workflow(page);

    let result = workflow.validate(&request("SAVE20")).await;

    assert_eq!(result.valid(), Verdict::Fail);
    assert_eq!(result.final_price().map(PriceReading::as_str), Some("SAR 100"));
    assert!(recorder.calls().contains(&"press Enter".to_string()));
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn visible_error_text_fails() {
    let page = Storefront {
        total_after_apply: Some("SAR 100"),
        error_after_apply: Some("Invalid coupon"),
        ..Storefront::default()
    };
    let (workflow, _) = workflow(page);

    let result = workflow.validate(&request("BOGUS")).await;

    assert_eq!(result.valid(), Verdict::Fail);
    assert_eq!(result.error_message(), Some("Invalid coupon"));
}

#[tokio::test(start_paused = true)]
async fn error_text_blocks_pass_even_when_total_drops() {
    let page = Storefront {
        error_after_apply: Some("Coupon expired"),
        ..Storefront::default()
    };
    let (workflow, _) = workflow(page);

    let result = workflow.validate(&request("OLD")).await;

    assert_eq!(result.valid(), Verdict::Fail);
}

#[tokio::test(start_paused = true)]
async fn missing_total_fails() {
    let page = Storefront {
        total_after_apply: None,
        ..Storefront::default()
    };
    let (workflow, _) = workflow(page);

    let result = workflow.validate(&request("SAVE20")).await;

    assert_eq!(result.valid(), Verdict::Fail);
    assert_eq!(result.final_price(), Some(&PriceReading::Missing));
}

#[tokio::test(start_paused = true)]
async fn launch_failure_reports_error_without_close() {
    let (workflow, recorder) = workflow_with(Storefront::default(), Some("chrome not found"));

    let result = workflow.validate(&request("SAVE20")).await;

    assert_eq!(result.valid(), Verdict::Error);
    assert!(result.reason().unwrap().contains("chrome not found"));
    assert_eq!(result.original_price(), None);
    assert_eq!(result.final_price(), None);
    assert_eq!(recorder.closes(), 0);
}

#[tokio::test(start_paused = true)]
async fn soft_failures_do_not_stop_the_run() {
    let page = Storefront {
        add_to_cart_button: false,
        cart_reachable: false,
        ..Storefront::default()
    };
    let (workflow, recorder) = workflow(page);

    let result = workflow.validate(&request("SAVE20")).await;

    assert_eq!(result.valid(), Verdict::Pass);
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn fatal_step_error_closes_session_once() {
    let page = Storefront {
        type_fails: true,
        ..Storefront::default()
    };
    let (workflow, recorder) = workflow(page);

    let result = workflow.validate(&request("SAVE20")).await;

    assert_eq!(result.valid(), Verdict::Error);
    assert!(result.reason().unwrap().contains("input detached"));
    assert_eq!(result.final_price(), None);
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn unknown_storefront_never_launches() {
    let (workflow, recorder) = workflow(Storefront::default());
    let request = ValidationRequest::parse(STORE, "SAVE20", PRODUCT, Some("amazon-us")).unwrap();

    let result = workflow.validate(&request).await;

    assert_eq!(result.valid(), Verdict::Error);
    assert_eq!(result.reason(), Some("unknown storefront profile: amazon-us"));
    assert_eq!(recorder.launches.load(Ordering::SeqCst), 0);
    assert_eq!(recorder.closes(), 0);
}

#[tokio::test(start_paused = true)]
async fn settle_delays_elapse_on_the_tokio_clock() {
    let (workflow, _) = workflow(Storefront::default());
    let started = tokio::time::Instant::now();

    workflow.validate(&request("SAVE20")).await;

    let settle = StorefrontProfile::noon_saudi().settle;
    let expected = settle.after_add_to_cart() + settle.after_type() + settle.after_apply();
    assert_eq!(started.elapsed(), expected);
}

#[tokio::test(start_paused = true)]
async fn failed_add_to_cart_skips_its_settle_delay() {
    let page = Storefront {
        add_to_cart_button: false,
        ..Storefront::default()
    };
    let (workflow, _) = workflow(page);
    let started = tokio::time::Instant::now();

    workflow.validate(&request("SAVE20")).await;

    let settle = StorefrontProfile::noon_saudi().settle;
    assert_eq!(started.elapsed(), settle.after_type() + settle.after_apply());
}

#[tokio::test(start_paused = true)]
async fn failed_promo_input_lookup_short_circuits() {
    let page = Storefront {
        promo_lookup_fails: true,
        ..Storefront::default()
    };
    let (workflow, recorder) = workflow(page);

    let result = workflow.validate(&request("SAVE20")).await;

    assert_eq!(result.valid(), Verdict::Error);
    assert_eq!(result.reason(), Some(PROMO_INPUT_NOT_FOUND));
    assert_eq!(result.original_price().map(PriceReading::as_str), Some("SAR 100"));
    assert_eq!(result.final_price(), Some(&PriceReading::Missing));
    assert!(!recorder.calls().iter().any(|c| c.starts_with("type ")));
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_apply_button_lookup_falls_back_to_enter() {
    let page = Storefront {
        apply_lookup_fails: true,
        ..Storefront::default()
    };
    let (workflow, recorder) = workflow(page);

    let result = workflow.validate(&request("SAVE20")).await;

    assert_eq!(result.valid(), Verdict::Pass);
    assert_eq!(result.final_price().map(PriceReading::as_str), Some("SAR 80"));
    let calls = recorder.calls();
    assert!(calls.contains(&"press Enter".to_string()));
    assert!(!calls.iter().any(|c| c.contains("apply_coupon_code")));
    assert_eq!(recorder.closes(), 1);
}

#[tokio::test]
async fn price_reads_are_repeatable() {
    let recorder = Arc::new(Recorder::default());
    let profile = StorefrontProfile::noon_saudi();
    let mut session = ScriptedSession {
        page: Storefront::default(),
        selectors: profile.clone(),
        recorder,
        applied: false,
    };

    let first = read_price(&mut session, &profile.selectors.price).await.unwrap();
    let second = read_price(&mut session, &profile.selectors.price).await.unwrap();

    assert_eq!(first, PriceReading::Shown("SAR 100".to_string()));
    assert_eq!(first, second);
}
