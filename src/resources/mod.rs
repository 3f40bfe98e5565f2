//! Typed property structs for the CloudFormation resource types this
//! workflow declares. Fields that may carry an intrinsic (`Ref`,
//! `Fn::GetAtt`, `Fn::Sub`) are `serde_json::Value`; everything else is a
//! plain typed field.

pub mod acm;
pub mod cloudfront;
pub mod route53;
pub mod s3;
