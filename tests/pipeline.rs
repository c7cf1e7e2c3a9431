//! Route-level behaviour, driven through `Server::handle` without a socket.

use std::sync::{Arc, Mutex};

use relay::{
    BoxedMiddleware, Config, Error, Handler, HttpError, Method, Request, Response, Server, middleware,
    send_json,
};
use serde_json::{Value, json};

type Trail = Arc<Mutex<Vec<&'static str>>>;

fn record(trail: &Trail, name: &'static str) -> BoxedMiddleware {
    let trail = Arc::clone(trail);
    relay::middleware::boxed(move |_req: &mut Request| -> Result<(), Error> {
        trail.lock().unwrap().push(name);
        Ok(())
    })
}

fn reject(trail: &Trail, name: &'static str, err: fn() -> Error) -> BoxedMiddleware {
    let trail = Arc::clone(trail);
    relay::middleware::boxed(move |_req: &mut Request| -> Result<(), Error> {
        trail.lock().unwrap().push(name);
        Err(err())
    })
}

fn controller(trail: Trail) -> impl Handler {
    move |_req: &mut Request, res: &mut Response| -> Result<(), Error> {
        trail.lock().unwrap().push("controller");
        send_json(res, &json!({"ok": true}))
    }
}

fn taken(trail: &Trail) -> Vec<&'static str> {
    std::mem::take(&mut *trail.lock().unwrap())
}

fn body(res: &Response) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

#[test]
fn global_then_route_middleware_run_in_registration_order() {
    let trail = Trail::default();
    let mut server = Server::new(Config::new(), vec![record(&trail, "g1"), record(&trail, "g2")]);
    server.get("/cars", controller(trail.clone()), vec![record(&trail, "r1"), record(&trail, "r2")]);

    let res = server.handle(Request::new(Method::Get, "/cars"));

    assert_eq!(res.status(), 200);
    assert_eq!(body(&res), json!({"ok": true}));
    assert_eq!(taken(&trail), ["g1", "g2", "r1", "r2", "controller"]);
}

#[test]
fn reordering_registration_reorders_execution() {
    let trail = Trail::default();
    let mut server = Server::new(Config::new(), middleware![]);
    server.get("/ab", controller(trail.clone()), vec![record(&trail, "a"), record(&trail, "b")]);
    server.get("/ba", controller(trail.clone()), vec![record(&trail, "b"), record(&trail, "a")]);

    server.handle(Request::new(Method::Get, "/ab"));
    assert_eq!(taken(&trail), ["a", "b", "controller"]);

    server.handle(Request::new(Method::Get, "/ba"));
    assert_eq!(taken(&trail), ["b", "a", "controller"]);
}

#[test]
fn failing_middleware_short_circuits_with_its_status() {
    let trail = Trail::default();
    let mut server = Server::new(Config::new(), vec![record(&trail, "g")]);
    server.post(
        "/cars",
        controller(trail.clone()),
        vec![
            record(&trail, "first"),
            reject(&trail, "auth", || HttpError::unauthorized("Invalid login").into()),
            record(&trail, "never"),
        ],
    );

    let res = server.handle(Request::new(Method::Post, "/cars"));

    assert_eq!(res.status(), 401);
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(body(&res), json!({"code": 401, "message": "Invalid login"}));
    assert_eq!(taken(&trail), ["g", "first", "auth"]);
}

#[test]
fn unstructured_controller_error_is_a_500_with_its_message() {
    let mut server = Server::new(Config::new(), middleware![]);
    server.get(
        "/boom",
        |_req: &mut Request, _res: &mut Response| -> Result<(), Error> { Err(Error::other("boom")) },
        middleware![],
    );

    let res = server.handle(Request::new(Method::Get, "/boom"));

    assert_eq!(res.status(), 500);
    assert_eq!(res.body(), br#"{"code":500,"message":"boom"}"#);
}

#[test]
fn global_middleware_added_later_only_reaches_later_routes() {
    let trail = Trail::default();
    let mut server = Server::new(Config::new(), vec![record(&trail, "early")]);
    server.get("/before", controller(trail.clone()), middleware![]);
    server.add_global_middleware(vec![record(&trail, "late")]);
    server.get("/after", controller(trail.clone()), middleware![]);

    server.handle(Request::new(Method::Get, "/before"));
    assert_eq!(taken(&trail), ["early", "controller"]);

    server.handle(Request::new(Method::Get, "/after"));
    assert_eq!(taken(&trail), ["early", "late", "controller"]);
}

#[test]
fn group_method_only_middleware_does_not_leak() {
    let trail = Trail::default();
    let mut server = Server::new(Config::new(), middleware![]);
    server.group("/author", vec![record(&trail, "group")])
        .get(controller(trail.clone()), vec![record(&trail, "extra")])
        .post(controller(trail.clone()), middleware![])
        .middleware(vec![record(&trail, "later")])
        .put(controller(trail.clone()), middleware![])
        .patch(controller(trail.clone()), vec![record(&trail, "patch-only")])
        .delete(controller(trail.clone()), middleware![]);

    let run = |method: Method| {
        server.handle(Request::new(method, "/author"));
        taken(&trail)
    };

    assert_eq!(run(Method::Get), ["group", "extra", "controller"]);
    assert_eq!(run(Method::Post), ["group", "controller"]);
    assert_eq!(run(Method::Put), ["group", "later", "controller"]);
    assert_eq!(run(Method::Patch), ["group", "later", "patch-only", "controller"]);
    assert_eq!(run(Method::Delete), ["group", "later", "controller"]);
}

#[test]
fn path_params_and_middleware_scope_reach_the_controller() {
    #[derive(Clone)]
    struct Character(String);

    fn decode_char(req: &mut Request) -> Result<(), Error> {
        #[derive(serde::Deserialize)]
        struct Body {
            name: String,
        }
        let body: Body = req.json()?;
        req.extensions_mut().insert(Character(body.name));
        Ok(())
    }

    fn show(req: &mut Request, res: &mut Response) -> Result<(), Error> {
        let character = req.extensions().get::<Character>()
            .ok_or_else(|| Error::other("no character in scope"))?;
        send_json(res, &json!({"game": req.param("game"), "name": character.0}))
    }

    let mut server = Server::new(Config::new(), middleware![]);
    server.post("/games/{game}/characters", show, middleware![decode_char]);

    let ok = server.handle(
        Request::new(Method::Post, "/games/mk/characters")
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"name": "Shao Khan", "wins": 9}"#),
    );
    assert_eq!(ok.status(), 200);
    assert_eq!(body(&ok), json!({"game": "mk", "name": "Shao Khan"}));

    let bad = server.handle(
        Request::new(Method::Post, "/games/mk/characters")
            .with_header("Content-Type", "text/plain")
            .with_body("Shao Khan"),
    );
    assert_eq!(bad.status(), 400);
}

#[test]
fn loggers_observe_errors_and_every_request() {
    let errors: Arc<Mutex<Vec<HttpError>>> = Arc::default();
    let accesses: Arc<Mutex<Vec<(Method, String)>>> = Arc::default();
    let config = Config::new()
        .error_logger({
            let errors = Arc::clone(&errors);
            move |err| errors.lock().unwrap().push(err.clone())
        })
        .access_logger({
            let accesses = Arc::clone(&accesses);
            move |req, _duration, _unit| {
                accesses.lock().unwrap().push((req.method(), req.path().to_owned()));
            }
        });

    let trail = Trail::default();
    let mut server = Server::new(config, middleware![]);
    server.get("/ok", controller(trail.clone()), middleware![]);
    server.get(
        "/denied",
        controller(trail.clone()),
        vec![reject(&trail, "deny", || HttpError::forbidden("no").into())],
    );

    server.handle(Request::new(Method::Get, "/ok"));
    server.handle(Request::new(Method::Get, "/denied"));
    server.handle(Request::new(Method::Get, "/denied"));

    assert_eq!(*errors.lock().unwrap(), [HttpError::forbidden("no"), HttpError::forbidden("no")]);
    assert_eq!(
        *accesses.lock().unwrap(),
        [
            (Method::Get, "/ok".to_owned()),
            (Method::Get, "/denied".to_owned()),
            (Method::Get, "/denied".to_owned()),
        ],
    );
}

#[test]
fn path_params_arrive_percent_decoded() {
    fn show(req: &mut Request, res: &mut Response) -> Result<(), Error> {
        send_json(res, &json!({"name": req.param("name")}))
    }

    let mut server = Server::new(Config::new(), middleware![]);
    server.get("/users/{name}", show, middleware![]);

    let res = server.handle(Request::new(Method::Get, "/users/j%C3%B6rg"));
    assert_eq!(body(&res), json!({"name": "jörg"}));

    let res = server.handle(Request::new(Method::Get, "/users/ada%20lovelace"));
    assert_eq!(body(&res), json!({"name": "ada lovelace"}));
}
