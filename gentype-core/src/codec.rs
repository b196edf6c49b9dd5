//! Encoding of option types into query parameters
use crate::{gvk::GroupVersion, Result};
use std::fmt::Debug;

/// An options type that can be written to a query string
///
/// Implemented by every options type in [`params`](crate::params) that travels as query parameters.
pub trait VersionedParams {
    /// Append the set parameters of this value to a query serializer
    fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>);
}

/// Strategy for turning options into query parameters for a given group version
///
/// A client holds one of these and hands it to every request it builds,
/// so alternate encodings (conversions between option versions, extra defaulted parameters)
/// can be swapped in without touching the verbs.
pub trait ParameterCodec: Debug + Send + Sync {
    /// Encode `params` as the list of query pairs for a request against `version`
    fn encode_parameters(
        &self,
        params: &dyn VersionedParams,
        version: &GroupVersion,
    ) -> Result<Vec<(String, String)>>;
}

/// The default codec, writing option fields under their `meta.k8s.io/v1` query names
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParameterCodec;

impl ParameterCodec for QueryParameterCodec {
    fn encode_parameters(
        &self,
        params: &dyn VersionedParams,
        _version: &GroupVersion,
    ) -> Result<Vec<(String, String)>> {
        let mut qp = form_urlencoded::Serializer::new(String::new());
        params.populate_qp(&mut qp);
        let encoded = qp.finish();
        Ok(form_urlencoded::parse(encoded.as_bytes()).into_owned().collect())
    }
}
