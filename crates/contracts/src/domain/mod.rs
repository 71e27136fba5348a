pub mod a001_pf_filing;
pub mod a002_esic_filing;
