use crate::error::AppError;
use actix_web::http::Method;
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

// 需要管理密钥的路径
struct ProtectedPaths {
    prefix_paths: Vec<&'static str>,
    // (方法, 完全匹配路径)
    method_paths: Vec<(Method, &'static str)>,
}

impl ProtectedPaths {
    fn new() -> Self {
        Self {
            prefix_paths: vec!["/api/v1/admin/"],
            method_paths: vec![(Method::POST, "/api/v1/prizes")],
        }
    }

    fn is_protected(&self, method: &Method, path: &str) -> bool {
        if self
            .prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
        {
            return true;
        }
        self.method_paths
            .iter()
            .any(|(m, p)| m == method && path.trim_end_matches('/') == *p)
    }
}

/// 管理端密钥校验; 未配置密钥时全部放行
pub struct AdminKeyMiddleware {
    api_key: Option<Rc<str>>,
}

impl AdminKeyMiddleware {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()).map(Rc::from),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminKeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminKeyMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminKeyMiddlewareService {
            service,
            api_key: self.api_key.clone(),
            protected_paths: ProtectedPaths::new(),
        }))
    }
}

pub struct AdminKeyMiddlewareService<S> {
    service: S,
    api_key: Option<Rc<str>>,
    protected_paths: ProtectedPaths,
}

impl<S, B> Service<ServiceRequest> for AdminKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let Some(expected) = self.api_key.as_deref() else {
            return Box::pin(self.service.call(req));
        };

        if !self.protected_paths.is_protected(req.method(), req.path()) {
            return Box::pin(self.service.call(req));
        }

        let provided = req
            .headers()
            .get(ADMIN_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        if provided == Some(expected) {
            Box::pin(self.service.call(req))
        } else {
            log::warn!(
                "Rejected admin request {} {}: bad or missing {ADMIN_KEY_HEADER}",
                req.method(),
                req.path()
            );
            let error = AppError::AuthError("Invalid admin key".to_string());
            Box::pin(async move { Err(error.into()) })
        }
    }
}
